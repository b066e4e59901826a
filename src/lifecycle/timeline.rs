//! Timeline derivation over ledger rows

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{enums::AvailabilityStatus, transaction::Transaction};

/// Ledger order: timestamp, then insertion sequence
pub fn sort_ledger(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        a.performed_at
            .cmp(&b.performed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Derived state of one tracking-code cycle
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CycleSummary {
    pub tracking_code: String,
    pub equipment_id: i32,
    pub opened_at: DateTime<Utc>,
    pub last_at: DateTime<Utc>,
    /// Status snapshot of the cycle's latest transaction
    pub current_status: AvailabilityStatus,
    pub closed: bool,
    pub transaction_count: usize,
}

/// Summarize an ordered timeline; `None` when it is empty
pub fn summarize(timeline: &[Transaction]) -> Option<CycleSummary> {
    let first = timeline.first()?;
    let last = timeline.last()?;
    Some(CycleSummary {
        tracking_code: first.tracking_code.clone(),
        equipment_id: first.equipment_id,
        opened_at: first.performed_at,
        last_at: last.performed_at,
        current_status: last.status,
        closed: last.transaction_type.closes_cycle(),
        transaction_count: timeline.len(),
    })
}

/// One cycle with its transactions
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Cycle {
    pub summary: CycleSummary,
    pub transactions: Vec<Transaction>,
}

/// Group an equipment's ledger into cycles, in order of each cycle's first
/// transaction.
pub fn group_cycles(mut transactions: Vec<Transaction>) -> Vec<Cycle> {
    sort_ledger(&mut transactions);

    let mut by_code: IndexMap<String, Vec<Transaction>> = IndexMap::new();
    for tx in transactions {
        by_code.entry(tx.tracking_code.clone()).or_default().push(tx);
    }

    by_code
        .into_values()
        .filter_map(|transactions| {
            summarize(&transactions).map(|summary| Cycle {
                summary,
                transactions,
            })
        })
        .collect()
}
