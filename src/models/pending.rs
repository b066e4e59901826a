//! Suspended transactions awaiting a person-match decision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    enums::PersonKind,
    person::{Client, Technician},
    transaction::RecordTransactionRequest,
};
use crate::lifecycle::matcher::MatchField;

/// A `record()` call parked until the caller confirms or rejects a match.
///
/// Stored as JSON in Redis; nothing about it touches the equipment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMatch {
    pub pending_id: Uuid,
    pub equipment_id: i32,
    pub request: RecordTransactionRequest,
    pub person_kind: PersonKind,
    pub suggested_id: i32,
    pub matched_on: Vec<MatchField>,
    pub created_at: DateTime<Utc>,
}

/// Existing record offered for confirmation
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SuggestedPerson {
    Client(Client),
    Technician(Technician),
}

/// Response body while a transaction waits on a person-match decision
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PersonMatchPending {
    pub pending_id: Uuid,
    pub equipment_id: i32,
    pub person_kind: PersonKind,
    /// Strong identifiers shared with the suggested record
    pub matched_on: Vec<MatchField>,
    pub suggested: SuggestedPerson,
}

/// Caller's answer to an ambiguous match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    UseExisting,
    CreateNew,
}

/// Body of `POST /equipment/{id}/transactions/resolve-person`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResolvePersonRequest {
    pub decision: Decision,
    /// Person to reuse; defaults to the suggested record
    pub matched_id: Option<i32>,
    /// Guards against resolving a newer suspension by mistake
    pub pending_id: Option<Uuid>,
}

/// How the recorder obtains the person for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonResolution {
    /// Run the matcher
    Classify,
    UseExisting(i32),
    CreateNew,
}
