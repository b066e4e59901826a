//! Equipment repository

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AvailabilityStatus, OperationalStatus},
        equipment::{CreateEquipment, Equipment, EquipmentRow},
    },
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all equipment
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment ORDER BY number")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Equipment::try_from).collect()
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?
            .try_into()
    }

    /// Create equipment in the `Available` state
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let operational = data.operational_status.unwrap_or(OperationalStatus::Operational);

        let row = sqlx::query_as::<_, EquipmentRow>(
            r#"
            INSERT INTO equipment (name, number, equipment_type, brand,
                                   availability_status, operational_status, laboratory_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.number)
        .bind(&data.equipment_type)
        .bind(&data.brand)
        .bind(i16::from(AvailabilityStatus::Available))
        .bind(i16::from(operational))
        .bind(data.laboratory_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Validation(format!("Equipment number '{}' already exists", data.number))
            }
            other => AppError::Database(other),
        })?;

        row.try_into()
    }

    /// Read the equipment row and hold its lock until the transaction ends.
    ///
    /// Every status change goes through this so that validation and commit
    /// are serialized per equipment id.
    pub async fn lock_for_update(conn: &mut PgConnection, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, EquipmentRow>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?
            .try_into()
    }

    /// Persist the status reached by a recorded transaction
    pub async fn set_status(
        conn: &mut PgConnection,
        id: i32,
        availability: AvailabilityStatus,
        operational: OperationalStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE equipment
            SET availability_status = $1, operational_status = $2, modif_date = $3
            WHERE id = $4
            "#,
        )
        .bind(i16::from(availability))
        .bind(i16::from(operational))
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
