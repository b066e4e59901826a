//! Tracking code lookup

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::transaction::TrackingTimeline};

/// Timeline of a tracking code, oldest transaction first
#[utoipa::path(
    get,
    path = "/tracking/{code}",
    tag = "tracking",
    params(("code" = String, Path, description = "Tracking code, e.g. TRK-7301992818412126208")),
    responses(
        (status = 200, description = "Timeline; empty with a null summary for an unknown code", body = TrackingTimeline),
        (status = 400, description = "Malformed tracking code", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_timeline(
    State(state): State<crate::AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<TrackingTimeline>> {
    let timeline = state.services.history.timeline(&code).await?;
    Ok(Json(timeline))
}
