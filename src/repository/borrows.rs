//! Borrows repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{Borrow, BorrowStatus},
};

/// Get a borrow header inside an open transaction
pub async fn tx_get_by_id(tx: &mut Transaction<'_, Postgres>, id: i64) -> AppResult<Borrow> {
    sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
}

/// Set a borrow's status inside an open transaction
pub async fn tx_set_status(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    status: BorrowStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE borrows SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Delete a borrow header inside an open transaction.
/// Line items must have been removed first.
pub async fn tx_delete(tx: &mut Transaction<'_, Postgres>, id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM borrows WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// List all borrow headers, newest first
    pub async fn list(&self) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            "SELECT * FROM borrows ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    /// Create a new borrow header
    pub async fn create(
        &self,
        user_id: i64,
        borrow_date: NaiveDate,
        due_date: Option<NaiveDate>,
        actual_return_date: Option<NaiveDate>,
        status: BorrowStatus,
    ) -> AppResult<i64> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO borrows (user_id, borrow_date, due_date, actual_return_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(borrow_date)
        .bind(due_date)
        .bind(actual_return_date)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Update a borrow header with already-merged field values
    pub async fn update(
        &self,
        id: i64,
        borrow_date: NaiveDate,
        due_date: Option<NaiveDate>,
        actual_return_date: Option<NaiveDate>,
        status: BorrowStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE borrows
            SET borrow_date = $1, due_date = $2, actual_return_date = $3, status = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(borrow_date)
        .bind(due_date)
        .bind(actual_return_date)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
