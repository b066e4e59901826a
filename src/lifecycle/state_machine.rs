//! Availability state machine for one equipment unit

use thiserror::Error;

use crate::models::enums::{AvailabilityStatus, TransactionType};

/// Event submitted while the unit is not in the event's source state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot apply '{event}' to equipment that is '{current}'")]
pub struct TransitionError {
    pub current: AvailabilityStatus,
    pub event: TransactionType,
}

/// Apply `event` to `current`, returning the resulting status.
///
/// `Lost` accepts no event; leaving it requires an administrative override
/// that lives outside this module.
pub fn transition(
    current: AvailabilityStatus,
    event: TransactionType,
) -> Result<AvailabilityStatus, TransitionError> {
    use AvailabilityStatus as S;
    use TransactionType as E;

    let next = match (current, event) {
        (S::Available, E::CheckOut) => S::CheckedOut,
        (S::CheckedOut, E::Return) => S::Available,
        (S::CheckedOut, E::MarkLost) => S::Lost,
        (S::Available, E::MaintenanceRelease) => S::MaintenancePending,
        (S::MaintenancePending, E::MaintenanceAccepted) => S::BeingMaintained,
        (S::MaintenancePending, E::MaintenanceCancelled) => S::Available,
        (S::BeingMaintained, E::RepairFinished) => S::Available,
        (S::BeingMaintained, E::RepairFailed) => S::Available,
        _ => return Err(TransitionError { current, event }),
    };

    Ok(next)
}

/// Events accepted from `current`, in declaration order
pub fn allowed_events(current: AvailabilityStatus) -> Vec<TransactionType> {
    TransactionType::ALL
        .into_iter()
        .filter(|event| transition(current, *event).is_ok())
        .collect()
}
