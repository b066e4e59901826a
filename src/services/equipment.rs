//! Equipment service

use validator::Validate;

use crate::{
    error::AppResult,
    lifecycle::allowed_events,
    models::equipment::{CreateEquipment, Equipment, EquipmentDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list().await
    }

    /// Equipment with the events its current status accepts
    pub async fn get_details(&self, id: i32) -> AppResult<EquipmentDetails> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        Ok(EquipmentDetails {
            allowed_events: allowed_events(equipment.availability_status),
            equipment,
        })
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!(equipment_id = equipment.id, number = %equipment.number, "Equipment created");
        Ok(equipment)
    }
}
