//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{AvailabilityStatus, OperationalStatus, TransactionType};
use crate::error::AppError;

/// Raw `equipment` row
#[derive(Debug, Clone, FromRow)]
pub struct EquipmentRow {
    pub id: i32,
    pub name: String,
    pub number: String,
    pub equipment_type: Option<String>,
    pub brand: Option<String>,
    pub availability_status: i16,
    pub operational_status: i16,
    pub laboratory_id: Option<i32>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Equipment name / description
    pub name: String,
    /// Unique equipment number, the payload of its QR label
    pub number: String,
    pub equipment_type: Option<String>,
    pub brand: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub operational_status: OperationalStatus,
    /// Owning laboratory (managed outside this service)
    pub laboratory_id: Option<i32>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl TryFrom<EquipmentRow> for Equipment {
    type Error = AppError;

    fn try_from(row: EquipmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            number: row.number,
            equipment_type: row.equipment_type,
            brand: row.brand,
            availability_status: AvailabilityStatus::try_from(row.availability_status)?,
            operational_status: OperationalStatus::try_from(row.operational_status)?,
            laboratory_id: row.laboratory_id,
            crea_date: row.crea_date,
            modif_date: row.modif_date,
        })
    }
}

/// Equipment with the events its current status accepts
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentDetails {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub allowed_events: Vec<TransactionType>,
}

/// Create equipment request; new units always start `Available`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "Number is required"))]
    pub number: String,
    pub equipment_type: Option<String>,
    pub brand: Option<String>,
    pub operational_status: Option<OperationalStatus>,
    pub laboratory_id: Option<i32>,
}
