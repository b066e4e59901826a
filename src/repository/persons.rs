//! Clients and technicians repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    lifecycle::matcher::normalize_contact,
    models::person::{Client, ClientInput, ClientRow, Technician, TechnicianInput},
};

#[derive(Clone)]
pub struct PersonsRepository {
    pool: Pool<Postgres>,
}

impl PersonsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get client by ID
    pub async fn get_client(&self, id: i32) -> AppResult<Client> {
        sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?
            .try_into()
    }

    /// Get technician by ID
    pub async fn get_technician(&self, id: i32) -> AppResult<Technician> {
        sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technician {} not found", id)))
    }

    /// Check that a client exists, inside the recorder's transaction
    pub async fn client_exists(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    /// Check that a technician exists, inside the recorder's transaction
    pub async fn technician_exists(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM technicians WHERE id = $1)")
                .bind(id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    /// Hold transaction-scoped advisory locks on a person's identity keys.
    ///
    /// Concurrent lookups for the same person queue here, so the second one
    /// sees the row the first one inserted.
    pub async fn lock_identity(conn: &mut PgConnection, keys: &[String]) -> AppResult<()> {
        for key in keys {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(key)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Clients sharing a contact number, an email, or a first + last name
    pub async fn client_candidates(
        conn: &mut PgConnection,
        input: &ClientInput,
    ) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&candidates_query("clients"))
            .bind(normalize_contact(input.contact_number.as_deref()))
            .bind(blank_to_none(input.email.as_deref()))
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .fetch_all(conn)
            .await?;

        rows.into_iter().map(Client::try_from).collect()
    }

    /// Technicians sharing a contact number, an email, or a first + last name
    pub async fn technician_candidates(
        conn: &mut PgConnection,
        input: &TechnicianInput,
    ) -> AppResult<Vec<Technician>> {
        let rows = sqlx::query_as::<_, Technician>(&candidates_query("technicians"))
            .bind(normalize_contact(input.contact_number.as_deref()))
            .bind(blank_to_none(input.email.as_deref()))
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    /// Insert a client from scan input
    pub async fn insert_client(conn: &mut PgConnection, input: &ClientInput) -> AppResult<Client> {
        sqlx::query_as::<_, ClientRow>(
            r#"
            INSERT INTO clients (first_name, middle_name, last_name, contact_number,
                                 email, address, client_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.first_name.trim())
        .bind(blank_to_none(input.middle_name.as_deref()))
        .bind(input.last_name.trim())
        .bind(blank_to_none(input.contact_number.as_deref()))
        .bind(blank_to_none(input.email.as_deref()))
        .bind(blank_to_none(input.address.as_deref()))
        .bind(input.client_type.map(i16::from))
        .fetch_one(conn)
        .await?
        .try_into()
    }

    /// Insert a technician from scan input
    pub async fn insert_technician(
        conn: &mut PgConnection,
        input: &TechnicianInput,
    ) -> AppResult<Technician> {
        let row = sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (first_name, middle_name, last_name, contact_number,
                                     email, shop_name, shop_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.first_name.trim())
        .bind(blank_to_none(input.middle_name.as_deref()))
        .bind(input.last_name.trim())
        .bind(blank_to_none(input.contact_number.as_deref()))
        .bind(blank_to_none(input.email.as_deref()))
        .bind(blank_to_none(input.shop_name.as_deref()))
        .bind(blank_to_none(input.shop_address.as_deref()))
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}

/// Contact number reduced to digits and `+`; indexed under this exact expression
pub(crate) const NORMALIZED_CONTACT: &str = "regexp_replace(contact_number, '[^0-9+]', '', 'g')";

fn candidates_query(table: &str) -> String {
    format!(
        r#"
        SELECT * FROM {table}
        WHERE ($1::text IS NOT NULL AND {contact} = $1)
           OR ($2::text IS NOT NULL AND LOWER(email) = LOWER($2))
           OR (LOWER(first_name) = LOWER($3) AND LOWER(last_name) = LOWER($4))
        ORDER BY id
        "#,
        table = table,
        contact = NORMALIZED_CONTACT,
    )
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
