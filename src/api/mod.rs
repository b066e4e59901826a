//! API handlers for Labtrack REST endpoints

pub mod equipment;
pub mod health;
pub mod openapi;
pub mod persons;
pub mod tracking;
pub mod transactions;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::{error::AppError, AppState};

/// Header naming the staff member performing a write
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extractor for the acting user on write endpoints
pub struct Actor(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing X-Actor-Id header".to_string()))?;

        parse_actor_id(raw).map(Actor)
    }
}

fn parse_actor_id(raw: &str) -> Result<i32, AppError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(format!(
            "X-Actor-Id must be a positive integer, got '{}'",
            raw
        ))),
    }
}
