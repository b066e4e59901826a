//! Tracking code issuance
//!
//! Codes look like `TRK-<n>`, `MTN-<n>` or `RET-<n>`. The numeric suffix is a
//! snowflake: millisecond timestamp, instance id and a per-process sequence,
//! so it strictly increases within one process and differs across processes
//! that are configured with distinct instance ids. The partial unique index on
//! `scanned_actions` is the final arbiter; see the recorder for the retry path.

use snowflaked::sync::Generator;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AvailabilityStatus, CycleFamily, TransactionType},
        transaction::Transaction,
    },
};

/// Largest instance id a snowflake can carry (10 bits)
pub const MAX_INSTANCE_ID: u16 = (1 << 10) - 1;

/// Code family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    CheckOut,
    Maintenance,
    DirectReturn,
}

impl CodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            CodeKind::CheckOut => "TRK",
            CodeKind::Maintenance => "MTN",
            CodeKind::DirectReturn => "RET",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "TRK" => Some(CodeKind::CheckOut),
            "MTN" => Some(CodeKind::Maintenance),
            "RET" => Some(CodeKind::DirectReturn),
            _ => None,
        }
    }
}

/// Process-wide code generator, shared behind the services container
pub struct TrackingCodeGenerator {
    generator: Generator,
}

impl TrackingCodeGenerator {
    pub fn new(instance_id: u16) -> AppResult<Self> {
        if instance_id > MAX_INSTANCE_ID {
            return Err(AppError::Validation(format!(
                "tracking.instance_id must be at most {}, got {}",
                MAX_INSTANCE_ID, instance_id
            )));
        }
        Ok(Self {
            generator: Generator::new(instance_id),
        })
    }

    pub fn new_code(&self, kind: CodeKind) -> String {
        let suffix: u64 = self.generator.generate();
        format!("{}-{}", kind.prefix(), suffix)
    }
}

/// Split a code into its kind and numeric suffix
pub fn parse(code: &str) -> Option<(CodeKind, u64)> {
    let (prefix, suffix) = code.split_once('-')?;
    let kind = CodeKind::from_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((kind, suffix.parse().ok()?))
}

/// Where the tracking code of a new transaction comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePlan {
    /// Continuation of the open cycle carrying this code
    Reuse(String),
    /// New cycle, or a continuation with no open cycle on record
    Mint(CodeKind),
}

/// Decide the code for `event` given the unit's current status and its most
/// recent transaction.
///
/// A cycle is open when the latest transaction belongs to the event's family,
/// did not close its cycle, and its status snapshot still matches the unit.
pub fn plan_code(
    event: TransactionType,
    current: AvailabilityStatus,
    last: Option<&Transaction>,
) -> CodePlan {
    if event.opens_cycle() {
        return CodePlan::Mint(mint_kind(event));
    }

    let open = last.filter(|tx| {
        tx.transaction_type.family() == event.family()
            && !tx.transaction_type.closes_cycle()
            && tx.status == current
    });

    match open {
        Some(tx) => CodePlan::Reuse(tx.tracking_code.clone()),
        None => CodePlan::Mint(mint_kind(event)),
    }
}

fn mint_kind(event: TransactionType) -> CodeKind {
    match (event.family(), event) {
        (CycleFamily::CheckOut, TransactionType::Return) => CodeKind::DirectReturn,
        (CycleFamily::CheckOut, _) => CodeKind::CheckOut,
        (CycleFamily::Maintenance, _) => CodeKind::Maintenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn last_tx(kind: TransactionType, status: AvailabilityStatus, code: &str) -> Transaction {
        Transaction {
            id: 1,
            equipment_id: 7,
            tracking_code: code.to_string(),
            transaction_type: kind,
            reason: None,
            status,
            operational_status: crate::models::enums::OperationalStatus::Operational,
            performed_at: Utc::now(),
            actor_id: 1,
            client_id: None,
            technician_id: None,
            return_datetime: None,
        }
    }

    #[test]
    fn test_code_format_and_prefixes() {
        let gen = TrackingCodeGenerator::new(1).unwrap();
        assert!(gen.new_code(CodeKind::CheckOut).starts_with("TRK-"));
        assert!(gen.new_code(CodeKind::Maintenance).starts_with("MTN-"));
        assert!(gen.new_code(CodeKind::DirectReturn).starts_with("RET-"));
    }

    #[test]
    fn test_instance_id_out_of_range_is_rejected() {
        assert!(TrackingCodeGenerator::new(MAX_INSTANCE_ID).is_ok());
        assert!(matches!(
            TrackingCodeGenerator::new(MAX_INSTANCE_ID + 1),
            Err(AppError::Validation(_))
        ));
        assert!(TrackingCodeGenerator::new(2000).is_err());
    }

    #[test]
    fn test_suffix_strictly_increases() {
        let gen = TrackingCodeGenerator::new(3).unwrap();
        let mut previous = 0u64;
        for _ in 0..2000 {
            let (_, suffix) = parse(&gen.new_code(CodeKind::CheckOut)).unwrap();
            assert!(suffix > previous);
            previous = suffix;
        }
    }

    #[test]
    fn test_unique_under_concurrency() {
        let gen = std::sync::Arc::new(TrackingCodeGenerator::new(2).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = gen.clone();
                std::thread::spawn(move || {
                    (0..500)
                        .map(|_| gen.new_code(CodeKind::Maintenance))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code));
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse("TRK-42"), Some((CodeKind::CheckOut, 42)));
        assert_eq!(parse("RET-7"), Some((CodeKind::DirectReturn, 7)));
        assert_eq!(parse("XYZ-42"), None);
        assert_eq!(parse("TRK-"), None);
        assert_eq!(parse("TRK-12a"), None);
        assert_eq!(parse("TRK-+12"), None);
        assert_eq!(parse("TRK42"), None);
    }

    #[test]
    fn test_opening_events_always_mint() {
        let open = last_tx(TransactionType::CheckOut, AvailabilityStatus::CheckedOut, "TRK-1");
        assert_eq!(
            plan_code(TransactionType::CheckOut, AvailabilityStatus::Available, Some(&open)),
            CodePlan::Mint(CodeKind::CheckOut)
        );
        assert_eq!(
            plan_code(TransactionType::MaintenanceRelease, AvailabilityStatus::Available, None),
            CodePlan::Mint(CodeKind::Maintenance)
        );
    }

    #[test]
    fn test_return_reuses_check_out_code() {
        let open = last_tx(TransactionType::CheckOut, AvailabilityStatus::CheckedOut, "TRK-99");
        assert_eq!(
            plan_code(TransactionType::Return, AvailabilityStatus::CheckedOut, Some(&open)),
            CodePlan::Reuse("TRK-99".into())
        );
        assert_eq!(
            plan_code(TransactionType::MarkLost, AvailabilityStatus::CheckedOut, Some(&open)),
            CodePlan::Reuse("TRK-99".into())
        );
    }

    #[test]
    fn test_maintenance_chain_reuses_code() {
        let accepted = last_tx(
            TransactionType::MaintenanceAccepted,
            AvailabilityStatus::BeingMaintained,
            "MTN-5",
        );
        assert_eq!(
            plan_code(
                TransactionType::RepairFinished,
                AvailabilityStatus::BeingMaintained,
                Some(&accepted)
            ),
            CodePlan::Reuse("MTN-5".into())
        );
    }

    #[test]
    fn test_return_without_open_cycle_is_direct_return() {
        let closed = last_tx(TransactionType::Return, AvailabilityStatus::Available, "TRK-1");
        assert_eq!(
            plan_code(TransactionType::Return, AvailabilityStatus::CheckedOut, Some(&closed)),
            CodePlan::Mint(CodeKind::DirectReturn)
        );
        assert_eq!(
            plan_code(TransactionType::Return, AvailabilityStatus::CheckedOut, None),
            CodePlan::Mint(CodeKind::DirectReturn)
        );
    }

    #[test]
    fn test_other_family_does_not_leak_code() {
        let release = last_tx(
            TransactionType::MaintenanceRelease,
            AvailabilityStatus::MaintenancePending,
            "MTN-3",
        );
        assert_eq!(
            plan_code(TransactionType::Return, AvailabilityStatus::CheckedOut, Some(&release)),
            CodePlan::Mint(CodeKind::DirectReturn)
        );
    }
}
