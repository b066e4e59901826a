//! Suspend/resume of transactions blocked on an ambiguous person match
//!
//! A suspension holds no database lock and changes nothing in Postgres; an
//! abandoned one simply expires from the store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    lifecycle::matcher::MatchField,
    models::{
        enums::PersonKind,
        pending::{Decision, PendingMatch, PersonResolution, ResolvePersonRequest},
        transaction::RecordTransactionRequest,
    },
};

/// Storage for pending matches, one slot per equipment id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PendingMatchStore: Send + Sync {
    async fn load(&self, equipment_id: i32) -> AppResult<Option<PendingMatch>>;
    async fn save(&self, pending: &PendingMatch, ttl_seconds: u64) -> AppResult<()>;
    async fn delete(&self, equipment_id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PendingMatchesService {
    store: Arc<dyn PendingMatchStore>,
    ttl_seconds: u64,
}

impl PendingMatchesService {
    pub fn new(store: Arc<dyn PendingMatchStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Park a request until the caller decides; replaces any older suspension
    /// for the same equipment.
    pub async fn suspend(
        &self,
        equipment_id: i32,
        request: RecordTransactionRequest,
        person_kind: PersonKind,
        suggested_id: i32,
        matched_on: Vec<MatchField>,
    ) -> AppResult<PendingMatch> {
        let pending = PendingMatch {
            pending_id: Uuid::new_v4(),
            equipment_id,
            request,
            person_kind,
            suggested_id,
            matched_on,
            created_at: Utc::now(),
        };
        self.store.save(&pending, self.ttl_seconds).await?;

        tracing::info!(
            equipment_id,
            pending_id = %pending.pending_id,
            person_kind = %person_kind,
            suggested_id,
            "Transaction suspended on ambiguous person match"
        );

        Ok(pending)
    }

    /// Look up the suspension a resolve call refers to and turn the caller's
    /// decision into a person resolution. The entry stays stored until
    /// [`settle`](Self::settle) so a failed resume can be retried.
    pub async fn claim(
        &self,
        equipment_id: i32,
        request: &ResolvePersonRequest,
    ) -> AppResult<(PendingMatch, PersonResolution)> {
        let pending = self
            .store
            .load(equipment_id)
            .await?
            .filter(|p| request.pending_id.map_or(true, |id| id == p.pending_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No pending person match for equipment {}",
                    equipment_id
                ))
            })?;

        let resolution = match request.decision {
            Decision::UseExisting => {
                PersonResolution::UseExisting(request.matched_id.unwrap_or(pending.suggested_id))
            }
            Decision::CreateNew => PersonResolution::CreateNew,
        };

        Ok((pending, resolution))
    }

    /// Drop a suspension once its resume reached a final outcome, unless a
    /// newer one has replaced it meanwhile.
    pub async fn settle(&self, pending: &PendingMatch) -> AppResult<()> {
        let current = self.store.load(pending.equipment_id).await?;
        if current.is_some_and(|c| c.pending_id == pending.pending_id) {
            self.store.delete(pending.equipment_id).await?;
        }
        Ok(())
    }

    /// [`settle`](Self::settle) once the outcome is already final. A store
    /// failure only leaves the entry to expire, so it is logged, not returned.
    pub async fn release(&self, pending: &PendingMatch) {
        if let Err(e) = self.settle(pending).await {
            tracing::warn!(
                equipment_id = pending.equipment_id,
                pending_id = %pending.pending_id,
                "Failed to clear settled person match: {}",
                e
            );
        }
    }
}
