//! History reconstruction over the ledger

use crate::{
    error::{AppError, AppResult},
    lifecycle::{
        timeline::{group_cycles, sort_ledger, summarize, Cycle},
        tracking_code,
    },
    models::transaction::{TrackingTimeline, Transaction},
    repository::Repository,
};

#[derive(Clone)]
pub struct HistoryService {
    repository: Repository,
}

impl HistoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All transactions carrying `code`, oldest first. An unknown code yields
    /// an empty timeline.
    pub async fn timeline(&self, code: &str) -> AppResult<TrackingTimeline> {
        let code = code.trim();
        if tracking_code::parse(code).is_none() {
            return Err(AppError::Validation(format!(
                "'{}' is not a tracking code",
                code
            )));
        }

        let mut transactions = self.repository.transactions.by_tracking_code(code).await?;
        sort_ledger(&mut transactions);

        Ok(TrackingTimeline {
            summary: summarize(&transactions),
            transactions,
        })
    }

    /// Most recent transaction of an equipment, whatever its code
    pub async fn last_transaction(&self, equipment_id: i32) -> AppResult<Option<Transaction>> {
        self.repository.equipment.get_by_id(equipment_id).await?;
        self.repository
            .transactions
            .last_for_equipment(equipment_id)
            .await
    }

    /// Full ledger of an equipment grouped into cycles
    pub async fn equipment_history(&self, equipment_id: i32) -> AppResult<Vec<Cycle>> {
        self.repository.equipment.get_by_id(equipment_id).await?;
        let transactions = self.repository.transactions.by_equipment(equipment_id).await?;
        Ok(group_cycles(transactions))
    }
}
