//! Ledger repository (`scanned_actions`)
//!
//! Insert-only: ledger rows are never updated or deleted.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AvailabilityStatus, OperationalStatus, TransactionType},
        transaction::{Transaction, TransactionRow},
    },
};

/// Name of the partial unique index guarding minted tracking codes
const CYCLE_CODE_INDEX: &str = "scanned_actions_cycle_code_key";

/// Values for a new ledger row
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub equipment_id: i32,
    pub tracking_code: &'a str,
    pub opens_cycle: bool,
    pub transaction_type: TransactionType,
    pub reason: Option<&'a str>,
    pub status: AvailabilityStatus,
    pub operational_status: OperationalStatus,
    pub actor_id: i32,
    pub client_id: Option<i32>,
    pub technician_id: Option<i32>,
    pub return_datetime: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append a ledger row.
    ///
    /// `performed_at` uses `clock_timestamp()`: it must be taken after the
    /// equipment row lock, not at the start of the database transaction.
    ///
    /// A collision on a freshly minted code surfaces as
    /// `DuplicateTrackingCode`; the surrounding database transaction is then
    /// unusable and must be rolled back by the caller.
    pub async fn insert(conn: &mut PgConnection, tx: &NewTransaction<'_>) -> AppResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO scanned_actions (
                equipment_id, tracking_code, opens_cycle, transaction_type, reason,
                status, operational_status, performed_at, actor_id,
                client_id, technician_id, return_datetime
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, clock_timestamp(), $8, $9, $10, $11)
            RETURNING id, equipment_id, tracking_code, transaction_type, reason,
                      status, operational_status, performed_at, actor_id,
                      client_id, technician_id, return_datetime
            "#,
        )
        .bind(tx.equipment_id)
        .bind(tx.tracking_code)
        .bind(tx.opens_cycle)
        .bind(i16::from(tx.transaction_type))
        .bind(tx.reason)
        .bind(i16::from(tx.status))
        .bind(i16::from(tx.operational_status))
        .bind(tx.actor_id)
        .bind(tx.client_id)
        .bind(tx.technician_id)
        .bind(tx.return_datetime)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db)
                if db.is_unique_violation() && db.constraint() == Some(CYCLE_CODE_INDEX) =>
            {
                AppError::DuplicateTrackingCode(tx.tracking_code.to_string())
            }
            other => AppError::Database(other),
        })?;

        row.try_into()
    }

    /// Most recent transaction of an equipment inside an open database transaction
    pub async fn last_for_equipment_locked(
        conn: &mut PgConnection,
        equipment_id: i32,
    ) -> AppResult<Option<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(LAST_FOR_EQUIPMENT)
            .bind(equipment_id)
            .fetch_optional(conn)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    /// Most recent transaction of an equipment, any tracking code
    pub async fn last_for_equipment(&self, equipment_id: i32) -> AppResult<Option<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(LAST_FOR_EQUIPMENT)
            .bind(equipment_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    /// All transactions sharing a tracking code, in ledger order
    pub async fn by_tracking_code(&self, code: &str) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM scanned_actions WHERE tracking_code = $1 ORDER BY performed_at, id",
            COLUMNS
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Full ledger of an equipment, in ledger order
    pub async fn by_equipment(&self, equipment_id: i32) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM scanned_actions WHERE equipment_id = $1 ORDER BY performed_at, id",
            COLUMNS
        ))
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }
}

const COLUMNS: &str = "id, equipment_id, tracking_code, transaction_type, reason, status, \
                       operational_status, performed_at, actor_id, client_id, technician_id, \
                       return_datetime";

const LAST_FOR_EQUIPMENT: &str = r#"
    SELECT id, equipment_id, tracking_code, transaction_type, reason, status,
           operational_status, performed_at, actor_id, client_id, technician_id,
           return_datetime
    FROM scanned_actions
    WHERE equipment_id = $1
    ORDER BY performed_at DESC, id DESC
    LIMIT 1
"#;
