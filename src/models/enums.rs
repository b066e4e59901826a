//! Shared domain enums
//!
//! Every enum is stored as a SMALLINT code and serialized on the wire with its
//! human label. Unknown codes read back from the database are rejected rather
//! than mapped to a default.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

macro_rules! smallint_codes {
    ($ty:ident, $label:literal { $($variant:ident = $code:literal),+ $(,)? }) => {
        impl TryFrom<i16> for $ty {
            type Error = AppError;

            fn try_from(v: i16) -> Result<Self, Self::Error> {
                match v {
                    $($code => Ok($ty::$variant),)+
                    other => Err(AppError::Internal(format!(
                        "Unknown {} code {}",
                        $label, other
                    ))),
                }
            }
        }

        impl From<$ty> for i16 {
            fn from(v: $ty) -> Self {
                v as i16
            }
        }
    };
}

// ---------------------------------------------------------------------------
// AvailabilityStatus
// ---------------------------------------------------------------------------

/// Availability of one equipment unit, driven by the lifecycle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum AvailabilityStatus {
    Available = 0,
    #[serde(rename = "Checked Out", alias = "In-Use")]
    CheckedOut = 1,
    /// Released into the maintenance workflow, awaiting technician pickup
    #[serde(rename = "Maintenance")]
    MaintenancePending = 2,
    #[serde(rename = "Being Maintained")]
    BeingMaintained = 3,
    Lost = 4,
}

smallint_codes!(AvailabilityStatus, "availability status" {
    Available = 0,
    CheckedOut = 1,
    MaintenancePending = 2,
    BeingMaintained = 3,
    Lost = 4,
});

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AvailabilityStatus::Available => "Available",
            AvailabilityStatus::CheckedOut => "Checked Out",
            AvailabilityStatus::MaintenancePending => "Maintenance",
            AvailabilityStatus::BeingMaintained => "Being Maintained",
            AvailabilityStatus::Lost => "Lost",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// OperationalStatus
// ---------------------------------------------------------------------------

/// Physical condition of a unit; independent of availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum OperationalStatus {
    Operational = 0,
    Defective = 1,
    Damaged = 2,
}

smallint_codes!(OperationalStatus, "operational status" {
    Operational = 0,
    Defective = 1,
    Damaged = 2,
});

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OperationalStatus::Operational => "Operational",
            OperationalStatus::Defective => "Defective",
            OperationalStatus::Damaged => "Damaged",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Lifecycle event, also recorded as the type of the resulting transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum TransactionType {
    #[serde(rename = "Check Out", alias = "check_out")]
    CheckOut = 0,
    #[serde(alias = "return")]
    Return = 1,
    #[serde(rename = "Maintenance Release", alias = "maintenance_release")]
    MaintenanceRelease = 2,
    #[serde(rename = "Maintenance Accepted", alias = "maintenance_accepted")]
    MaintenanceAccepted = 3,
    #[serde(rename = "Maintenance Cancelled", alias = "maintenance_cancelled")]
    MaintenanceCancelled = 4,
    #[serde(rename = "Repair Finished", alias = "repair_finished")]
    RepairFinished = 5,
    #[serde(rename = "Repair Failed", alias = "repair_failed")]
    RepairFailed = 6,
    #[serde(rename = "Mark Lost", alias = "mark_lost")]
    MarkLost = 7,
}

smallint_codes!(TransactionType, "transaction type" {
    CheckOut = 0,
    Return = 1,
    MaintenanceRelease = 2,
    MaintenanceAccepted = 3,
    MaintenanceCancelled = 4,
    RepairFinished = 5,
    RepairFailed = 6,
    MarkLost = 7,
});

impl TransactionType {
    pub const ALL: [TransactionType; 8] = [
        TransactionType::CheckOut,
        TransactionType::Return,
        TransactionType::MaintenanceRelease,
        TransactionType::MaintenanceAccepted,
        TransactionType::MaintenanceCancelled,
        TransactionType::RepairFinished,
        TransactionType::RepairFailed,
        TransactionType::MarkLost,
    ];

    /// Which cycle family the event belongs to
    pub fn family(self) -> CycleFamily {
        match self {
            TransactionType::CheckOut | TransactionType::Return | TransactionType::MarkLost => {
                CycleFamily::CheckOut
            }
            TransactionType::MaintenanceRelease
            | TransactionType::MaintenanceAccepted
            | TransactionType::MaintenanceCancelled
            | TransactionType::RepairFinished
            | TransactionType::RepairFailed => CycleFamily::Maintenance,
        }
    }

    /// Events that start a new cycle and therefore mint a tracking code
    pub fn opens_cycle(self) -> bool {
        matches!(self, TransactionType::CheckOut | TransactionType::MaintenanceRelease)
    }

    /// Events after which the cycle is over
    pub fn closes_cycle(self) -> bool {
        matches!(
            self,
            TransactionType::Return
                | TransactionType::MarkLost
                | TransactionType::MaintenanceCancelled
                | TransactionType::RepairFinished
                | TransactionType::RepairFailed
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionType::CheckOut => "Check Out",
            TransactionType::Return => "Return",
            TransactionType::MaintenanceRelease => "Maintenance Release",
            TransactionType::MaintenanceAccepted => "Maintenance Accepted",
            TransactionType::MaintenanceCancelled => "Maintenance Cancelled",
            TransactionType::RepairFinished => "Repair Finished",
            TransactionType::RepairFailed => "Repair Failed",
            TransactionType::MarkLost => "Mark Lost",
        };
        write!(f, "{}", label)
    }
}

/// Cycle family of an event; decides which person kind and code prefix apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleFamily {
    CheckOut,
    Maintenance,
}

// ---------------------------------------------------------------------------
// ClientType
// ---------------------------------------------------------------------------

/// Client category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum ClientType {
    Student = 0,
    Instructor = 1,
}

smallint_codes!(ClientType, "client type" {
    Student = 0,
    Instructor = 1,
});

// ---------------------------------------------------------------------------
// PersonKind
// ---------------------------------------------------------------------------

/// Which person table a match refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    Client,
    Technician,
}

impl std::fmt::Display for PersonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonKind::Client => write!(f, "client"),
            PersonKind::Technician => write!(f, "technician"),
        }
    }
}
