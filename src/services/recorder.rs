//! Transaction recorder
//!
//! Records one scan as a single database transaction: lock the equipment row,
//! validate the event, decide the tracking code, resolve the person, append
//! the ledger row and update the equipment status. Nothing is written unless
//! every step succeeds.

use std::{future::Future, sync::Arc};

use sqlx::PgConnection;

use crate::{
    config::TrackingConfig,
    error::{AppError, AppResult},
    lifecycle::{
        classify,
        matcher::{identity_keys, MatchField},
        transition,
        tracking_code::{plan_code, CodePlan},
        MatchOutcome, TrackingCodeGenerator,
    },
    models::{
        enums::PersonKind,
        pending::{PersonMatchPending, PersonResolution, ResolvePersonRequest, SuggestedPerson},
        person::PersonInput,
        transaction::{RecordTransactionRequest, Transaction},
    },
    repository::{
        equipment::EquipmentRepository,
        persons::PersonsRepository,
        transactions::{NewTransaction, TransactionsRepository},
        Repository,
    },
    services::pending::PendingMatchesService,
};

/// Result of one locked attempt
enum Attempt {
    Recorded(Transaction),
    /// Rolled back; the caller has to confirm the suggested person first
    Ambiguous {
        person_kind: PersonKind,
        suggested: SuggestedPerson,
        matched_on: Vec<MatchField>,
    },
}

/// Outcome of resolving the person attached to a request
enum PersonStep {
    Resolved(i32),
    Ambiguous {
        suggested: SuggestedPerson,
        matched_on: Vec<MatchField>,
    },
}

#[derive(Clone)]
pub struct RecorderService {
    repository: Repository,
    codes: Arc<TrackingCodeGenerator>,
    pending: PendingMatchesService,
    max_code_attempts: u32,
}

impl RecorderService {
    pub fn new(
        repository: Repository,
        config: &TrackingConfig,
        pending: PendingMatchesService,
    ) -> AppResult<Self> {
        Ok(Self {
            repository,
            codes: Arc::new(TrackingCodeGenerator::new(config.instance_id)?),
            pending,
            max_code_attempts: config.max_code_attempts.max(1),
        })
    }

    /// Record a scanned action against an equipment unit.
    ///
    /// When the attached person closely resembles an existing record the
    /// request is parked and `AppError::PersonMatchPending` is returned; no
    /// state changes until [`resolve_person`](Self::resolve_person) is called.
    pub async fn record(
        &self,
        equipment_id: i32,
        actor_id: i32,
        request: RecordTransactionRequest,
    ) -> AppResult<Transaction> {
        request.check_payload()?;

        match self
            .record_with(equipment_id, actor_id, &request, PersonResolution::Classify)
            .await?
        {
            Attempt::Recorded(transaction) => Ok(transaction),
            Attempt::Ambiguous {
                person_kind,
                suggested,
                matched_on,
            } => {
                let pending = self
                    .park(equipment_id, request, person_kind, suggested, matched_on)
                    .await?;
                Err(AppError::PersonMatchPending(Box::new(pending)))
            }
        }
    }

    /// Resume a parked request with the caller's decision on the person.
    ///
    /// The equipment status is validated again: a transition made by someone
    /// else in the meantime invalidates the parked request.
    pub async fn resolve_person(
        &self,
        equipment_id: i32,
        actor_id: i32,
        decision: &ResolvePersonRequest,
    ) -> AppResult<Transaction> {
        let (pending, resolution) = self.pending.claim(equipment_id, decision).await?;

        let result = self
            .record_with(equipment_id, actor_id, &pending.request, resolution)
            .await;

        match result {
            Ok(Attempt::Recorded(transaction)) => {
                self.pending.release(&pending).await;
                Ok(transaction)
            }
            Ok(Attempt::Ambiguous { .. }) => Err(AppError::Internal(
                "Person match stayed ambiguous after an explicit decision".to_string(),
            )),
            Err(e @ AppError::InvalidTransition(_)) => {
                self.pending.release(&pending).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn park(
        &self,
        equipment_id: i32,
        request: RecordTransactionRequest,
        person_kind: PersonKind,
        suggested: SuggestedPerson,
        matched_on: Vec<MatchField>,
    ) -> AppResult<PersonMatchPending> {
        let suggested_id = match &suggested {
            SuggestedPerson::Client(c) => c.id,
            SuggestedPerson::Technician(t) => t.id,
        };

        let pending = self
            .pending
            .suspend(equipment_id, request, person_kind, suggested_id, matched_on)
            .await?;

        Ok(PersonMatchPending {
            pending_id: pending.pending_id,
            equipment_id,
            person_kind,
            matched_on: pending.matched_on,
            suggested,
        })
    }

    /// Run the locked unit, retrying when a minted code collides
    async fn record_with(
        &self,
        equipment_id: i32,
        actor_id: i32,
        request: &RecordTransactionRequest,
        resolution: PersonResolution,
    ) -> AppResult<Attempt> {
        retry_on_collision(self.max_code_attempts, equipment_id, move || {
            self.try_record(equipment_id, actor_id, request, resolution)
        })
        .await
    }

    async fn try_record(
        &self,
        equipment_id: i32,
        actor_id: i32,
        request: &RecordTransactionRequest,
        resolution: PersonResolution,
    ) -> AppResult<Attempt> {
        let mut tx = self.repository.pool.begin().await?;

        let equipment = EquipmentRepository::lock_for_update(&mut *tx, equipment_id).await?;
        let current = equipment.availability_status;
        let next = transition(current, request.event)?;

        let last = TransactionsRepository::last_for_equipment_locked(&mut *tx, equipment_id).await?;
        let (tracking_code, opens_cycle) = match plan_code(request.event, current, last.as_ref()) {
            CodePlan::Reuse(code) => (code, false),
            CodePlan::Mint(kind) => (self.codes.new_code(kind), true),
        };

        let (mut client_id, mut technician_id) = (None, None);
        if let Some(person) = request.person() {
            let person_kind = match person {
                PersonInput::Client(_) => PersonKind::Client,
                PersonInput::Technician(_) => PersonKind::Technician,
            };
            match resolve_person_id(&mut *tx, person, resolution).await? {
                PersonStep::Resolved(id) => match person_kind {
                    PersonKind::Client => client_id = Some(id),
                    PersonKind::Technician => technician_id = Some(id),
                },
                PersonStep::Ambiguous {
                    suggested,
                    matched_on,
                } => {
                    tx.rollback().await?;
                    return Ok(Attempt::Ambiguous {
                        person_kind,
                        suggested,
                        matched_on,
                    });
                }
            }
        }

        let operational_status = request
            .operational_status
            .unwrap_or(equipment.operational_status);

        let transaction = TransactionsRepository::insert(
            &mut *tx,
            &NewTransaction {
                equipment_id,
                tracking_code: &tracking_code,
                opens_cycle,
                transaction_type: request.event,
                reason: request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()),
                status: next,
                operational_status,
                actor_id,
                client_id,
                technician_id,
                return_datetime: request.return_datetime,
            },
        )
        .await?;

        EquipmentRepository::set_status(&mut *tx, equipment_id, next, operational_status).await?;

        tx.commit().await?;

        tracing::info!(
            equipment_id,
            tracking_code = %transaction.tracking_code,
            event = %request.event,
            from = %current,
            to = %next,
            actor_id,
            "Transaction recorded"
        );

        Ok(Attempt::Recorded(transaction))
    }
}

async fn resolve_person_id(
    conn: &mut PgConnection,
    person: PersonInput<'_>,
    resolution: PersonResolution,
) -> AppResult<PersonStep> {
    match person {
        PersonInput::Client(input) => match resolution {
            PersonResolution::UseExisting(id) => {
                if !PersonsRepository::client_exists(&mut *conn, id).await? {
                    return Err(AppError::NotFound(format!("Client {} not found", id)));
                }
                Ok(PersonStep::Resolved(id))
            }
            PersonResolution::CreateNew => {
                let created = PersonsRepository::insert_client(conn, input).await?;
                Ok(PersonStep::Resolved(created.id))
            }
            PersonResolution::Classify => {
                let keys = identity_keys(PersonKind::Client, input);
                PersonsRepository::lock_identity(&mut *conn, &keys).await?;
                let candidates = PersonsRepository::client_candidates(&mut *conn, input).await?;
                match classify(input, &candidates) {
                    MatchOutcome::Exact(id) => Ok(PersonStep::Resolved(id)),
                    MatchOutcome::None => {
                        let created = PersonsRepository::insert_client(conn, input).await?;
                        Ok(PersonStep::Resolved(created.id))
                    }
                    MatchOutcome::Ambiguous {
                        existing_id,
                        matched_on,
                    } => {
                        let suggested = take_by_id(candidates, existing_id, |c| c.id)?;
                        Ok(PersonStep::Ambiguous {
                            suggested: SuggestedPerson::Client(suggested),
                            matched_on,
                        })
                    }
                }
            }
        },
        PersonInput::Technician(input) => match resolution {
            PersonResolution::UseExisting(id) => {
                if !PersonsRepository::technician_exists(&mut *conn, id).await? {
                    return Err(AppError::NotFound(format!("Technician {} not found", id)));
                }
                Ok(PersonStep::Resolved(id))
            }
            PersonResolution::CreateNew => {
                let created = PersonsRepository::insert_technician(conn, input).await?;
                Ok(PersonStep::Resolved(created.id))
            }
            PersonResolution::Classify => {
                let keys = identity_keys(PersonKind::Technician, input);
                PersonsRepository::lock_identity(&mut *conn, &keys).await?;
                let candidates =
                    PersonsRepository::technician_candidates(&mut *conn, input).await?;
                match classify(input, &candidates) {
                    MatchOutcome::Exact(id) => Ok(PersonStep::Resolved(id)),
                    MatchOutcome::None => {
                        let created = PersonsRepository::insert_technician(conn, input).await?;
                        Ok(PersonStep::Resolved(created.id))
                    }
                    MatchOutcome::Ambiguous {
                        existing_id,
                        matched_on,
                    } => {
                        let suggested = take_by_id(candidates, existing_id, |t| t.id)?;
                        Ok(PersonStep::Ambiguous {
                            suggested: SuggestedPerson::Technician(suggested),
                            matched_on,
                        })
                    }
                }
            }
        },
    }
}

/// Run `attempt` again while it fails on a tracking code collision, at most
/// `max_attempts` times in total
async fn retry_on_collision<T, F, Fut>(
    max_attempts: u32,
    equipment_id: i32,
    mut attempt: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut count = 1;
    loop {
        match attempt().await {
            Err(e) if e.is_retryable() && count < max_attempts => {
                tracing::warn!(
                    equipment_id,
                    attempt = count,
                    "Tracking code collision, retrying: {}",
                    e
                );
                count += 1;
            }
            other => return other,
        }
    }
}

/// Pick the matcher's suggestion out of the candidate rows it was given
fn take_by_id<T>(rows: Vec<T>, id: i32, id_of: impl Fn(&T) -> i32) -> AppResult<T> {
    rows.into_iter()
        .find(|row| id_of(row) == id)
        .ok_or_else(|| AppError::Internal(format!("Matched person {} missing from candidates", id)))
}
