//! Transaction recording endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        pending::ResolvePersonRequest,
        transaction::{RecordTransactionRequest, Transaction},
    },
};

use super::Actor;

/// Record a scanned action against an equipment unit
///
/// Responds 202 with a pending person match when the attached client or
/// technician resembles an existing record; nothing is recorded until the
/// match is resolved.
#[utoipa::path(
    post,
    path = "/equipment/{id}/transactions",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Equipment ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting staff member")
    ),
    request_body = RecordTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = Transaction),
        (status = 202, description = "Person match needs confirmation", body = crate::models::pending::PersonMatchPending),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Event not allowed in the current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_transaction(
    State(state): State<crate::AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    Json(request): Json<RecordTransactionRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let transaction = state.services.recorder.record(id, actor_id, request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Resume a transaction suspended on a person match
#[utoipa::path(
    post,
    path = "/equipment/{id}/transactions/resolve-person",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Equipment ID"),
        ("X-Actor-Id" = i32, Header, description = "Acting staff member")
    ),
    request_body = ResolvePersonRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = Transaction),
        (status = 404, description = "No matching suspension, or unknown person", body = crate::error::ErrorResponse),
        (status = 409, description = "Equipment status changed meanwhile", body = crate::error::ErrorResponse)
    )
)]
pub async fn resolve_person(
    State(state): State<crate::AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    Json(request): Json<ResolvePersonRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let transaction = state
        .services
        .recorder
        .resolve_person(id, actor_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}
