//! Business logic services

pub mod equipment;
pub mod history;
pub mod pending;
pub mod persons;
pub mod recorder;
pub mod redis;

use std::sync::Arc;

use crate::{
    config::{PendingMatchesConfig, TrackingConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub history: history::HistoryService,
    pub persons: persons::PersonsService,
    pub recorder: recorder::RecorderService,
    pub redis: redis::RedisService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        tracking_config: &TrackingConfig,
        pending_config: &PendingMatchesConfig,
        redis_service: redis::RedisService,
    ) -> AppResult<Self> {
        let pending = pending::PendingMatchesService::new(
            Arc::new(redis_service.clone()),
            pending_config.ttl_seconds,
        );

        Ok(Self {
            equipment: equipment::EquipmentService::new(repository.clone()),
            history: history::HistoryService::new(repository.clone()),
            persons: persons::PersonsService::new(repository.clone()),
            recorder: recorder::RecorderService::new(repository.clone(), tracking_config, pending)?,
            redis: redis_service,
            repository,
        })
    }
}
