//! Equipment API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    lifecycle::timeline::Cycle,
    models::{
        equipment::{CreateEquipment, Equipment, EquipmentDetails},
        transaction::Transaction,
    },
};

use super::Actor;

/// List all equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state.services.equipment.list().await?;
    Ok(Json(equipment))
}

/// Get equipment by ID, with the events it currently accepts
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = EquipmentDetails),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<EquipmentDetails>> {
    let details = state.services.equipment.get_details(id).await?;
    Ok(Json(details))
}

/// Register equipment; it starts out available
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    params(("X-Actor-Id" = i32, Header, description = "Acting staff member")),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 400, description = "Invalid input or duplicate number", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    Actor(_actor_id): Actor,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    let equipment = state.services.equipment.create(&data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Most recent transaction of an equipment, whatever its tracking code
#[utoipa::path(
    get,
    path = "/equipment/{id}/last-transaction",
    tag = "equipment",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Latest transaction, or null when none was recorded", body = Transaction),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn last_transaction(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Option<Transaction>>> {
    let transaction = state.services.history.last_transaction(id).await?;
    Ok(Json(transaction))
}

/// Complete ledger of an equipment grouped by tracking code
#[utoipa::path(
    get,
    path = "/equipment/{id}/history",
    tag = "equipment",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Cycles in order of their first transaction", body = Vec<Cycle>),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn equipment_history(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Cycle>>> {
    let cycles = state.services.history.equipment_history(id).await?;
    Ok(Json(cycles))
}
