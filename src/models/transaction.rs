//! Ledger transaction (scanned action) model and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    enums::{AvailabilityStatus, CycleFamily, OperationalStatus, TransactionType},
    person::{ClientInput, PersonInput, TechnicianInput},
};
use crate::{
    error::{AppError, AppResult},
    lifecycle::timeline::CycleSummary,
};

/// Raw `scanned_actions` row
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub equipment_id: i32,
    pub tracking_code: String,
    pub transaction_type: i16,
    pub reason: Option<String>,
    pub status: i16,
    pub operational_status: i16,
    pub performed_at: DateTime<Utc>,
    pub actor_id: i32,
    pub client_id: Option<i32>,
    pub technician_id: Option<i32>,
    pub return_datetime: Option<DateTime<Utc>>,
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Action ID; also the insertion sequence
    pub id: i64,
    pub equipment_id: i32,
    pub tracking_code: String,
    pub transaction_type: TransactionType,
    pub reason: Option<String>,
    /// Equipment availability immediately after this transaction
    pub status: AvailabilityStatus,
    pub operational_status: OperationalStatus,
    pub performed_at: DateTime<Utc>,
    pub actor_id: i32,
    pub client_id: Option<i32>,
    pub technician_id: Option<i32>,
    pub return_datetime: Option<DateTime<Utc>>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            equipment_id: row.equipment_id,
            tracking_code: row.tracking_code,
            transaction_type: TransactionType::try_from(row.transaction_type)?,
            reason: row.reason,
            status: AvailabilityStatus::try_from(row.status)?,
            operational_status: OperationalStatus::try_from(row.operational_status)?,
            performed_at: row.performed_at,
            actor_id: row.actor_id,
            client_id: row.client_id,
            technician_id: row.technician_id,
            return_datetime: row.return_datetime,
        })
    }
}

/// Ordered timeline of one tracking code
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingTimeline {
    /// Absent when no transaction carries the code
    pub summary: Option<CycleSummary>,
    pub transactions: Vec<Transaction>,
}

/// Body of `POST /equipment/{id}/transactions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordTransactionRequest {
    pub event: TransactionType,
    /// Purpose or free-text reason
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
    #[validate(nested)]
    pub client: Option<ClientInput>,
    #[validate(nested)]
    pub technician: Option<TechnicianInput>,
    /// Expected return on check-out, actual return on return
    pub return_datetime: Option<DateTime<Utc>>,
    /// Condition observed at this scan; left unchanged when absent
    pub operational_status: Option<OperationalStatus>,
}

impl RecordTransactionRequest {
    /// Person details carried by the request, if any
    pub fn person(&self) -> Option<PersonInput<'_>> {
        match (&self.client, &self.technician) {
            (Some(client), _) => Some(PersonInput::Client(client)),
            (None, Some(technician)) => Some(PersonInput::Technician(technician)),
            (None, None) => None,
        }
    }

    /// Event-specific field rules, checked before any database access
    pub fn check_payload(&self) -> AppResult<()> {
        self.validate()?;

        let reason_missing = self
            .reason
            .as_deref()
            .map_or(true, |r| r.trim().is_empty());

        match self.event.family() {
            CycleFamily::CheckOut if self.technician.is_some() => {
                return Err(AppError::Validation(format!(
                    "A technician cannot be attached to a '{}' transaction",
                    self.event
                )));
            }
            CycleFamily::Maintenance if self.client.is_some() => {
                return Err(AppError::Validation(format!(
                    "A client cannot be attached to a '{}' transaction",
                    self.event
                )));
            }
            _ => {}
        }

        match self.event {
            TransactionType::CheckOut => {
                let client = self.client.as_ref().ok_or_else(|| {
                    AppError::Validation("Client details are required to check out".to_string())
                })?;
                if client.contact_number.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "Client contact_number is required to check out".to_string(),
                    ));
                }
                if reason_missing {
                    return Err(AppError::Validation(
                        "A reason is required to check out".to_string(),
                    ));
                }
            }
            TransactionType::MaintenanceRelease => {
                let technician = self.technician.as_ref().ok_or_else(|| {
                    AppError::Validation(
                        "Technician details are required to release for maintenance".to_string(),
                    )
                })?;
                if technician.contact_number.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "Technician contact_number is required to release for maintenance"
                            .to_string(),
                    ));
                }
            }
            _ => {}
        }

        if self.return_datetime.is_some()
            && !matches!(self.event, TransactionType::CheckOut | TransactionType::Return)
        {
            return Err(AppError::Validation(format!(
                "return_datetime is not accepted on a '{}' transaction",
                self.event
            )));
        }

        Ok(())
    }
}
