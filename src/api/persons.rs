//! Client and technician endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::person::{Client, Technician},
};

/// Get client by ID
#[utoipa::path(
    get,
    path = "/clients/{id}",
    tag = "persons",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = Client),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_client(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Client>> {
    let client = state.services.persons.get_client(id).await?;
    Ok(Json(client))
}

/// Get technician by ID
#[utoipa::path(
    get,
    path = "/technicians/{id}",
    tag = "persons",
    params(("id" = i32, Path, description = "Technician ID")),
    responses(
        (status = 200, description = "Technician", body = Technician),
        (status = 404, description = "Technician not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_technician(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Technician>> {
    let technician = state.services.persons.get_technician(id).await?;
    Ok(Json(technician))
}
