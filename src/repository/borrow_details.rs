//! Borrow details (line items) repository for database operations
//!
//! Every mutation here runs inside a caller-owned transaction, because a
//! line-item change is only valid together with its matching availability
//! adjustment on the books table.

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrow::BorrowDetail,
};

/// Get a line item inside an open transaction
pub async fn tx_get_by_id(tx: &mut Transaction<'_, Postgres>, id: i64) -> AppResult<BorrowDetail> {
    sqlx::query_as::<_, BorrowDetail>("SELECT * FROM borrow_details WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow detail with id {} not found", id)))
}

/// Load several line items by id inside an open transaction.
/// The result is in no particular order and may be shorter than `ids`.
pub async fn tx_get_by_ids(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
) -> AppResult<Vec<BorrowDetail>> {
    let details = sqlx::query_as::<_, BorrowDetail>(
        "SELECT * FROM borrow_details WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(details)
}

/// Load all line items of a borrow inside an open transaction
pub async fn tx_list_by_borrow(
    tx: &mut Transaction<'_, Postgres>,
    borrow_id: i64,
) -> AppResult<Vec<BorrowDetail>> {
    let details = sqlx::query_as::<_, BorrowDetail>(
        "SELECT * FROM borrow_details WHERE borrow_id = $1 ORDER BY id",
    )
    .bind(borrow_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(details)
}

/// Insert a line item inside an open transaction
pub async fn tx_insert(
    tx: &mut Transaction<'_, Postgres>,
    borrow_id: i64,
    book_id: i64,
    quantity: i32,
) -> AppResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO borrow_details (borrow_id, book_id, quantity)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(borrow_id)
    .bind(book_id)
    .bind(quantity)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

/// Update a line item's book and quantity inside an open transaction
pub async fn tx_update(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    book_id: i64,
    quantity: i32,
) -> AppResult<()> {
    sqlx::query("UPDATE borrow_details SET book_id = $1, quantity = $2 WHERE id = $3")
        .bind(book_id)
        .bind(quantity)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Delete a line item inside an open transaction
pub async fn tx_delete(tx: &mut Transaction<'_, Postgres>, id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM borrow_details WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Delete several line items inside an open transaction
pub async fn tx_delete_many(tx: &mut Transaction<'_, Postgres>, ids: &[i64]) -> AppResult<()> {
    sqlx::query("DELETE FROM borrow_details WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct BorrowDetailsRepository {
    pool: Pool<Postgres>,
}

impl BorrowDetailsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List line items for a borrow transaction
    pub async fn list_by_borrow(&self, borrow_id: i64) -> AppResult<Vec<BorrowDetail>> {
        let details = sqlx::query_as::<_, BorrowDetail>(
            "SELECT * FROM borrow_details WHERE borrow_id = $1 ORDER BY id",
        )
        .bind(borrow_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Get line item by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<BorrowDetail> {
        sqlx::query_as::<_, BorrowDetail>("SELECT * FROM borrow_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow detail with id {} not found", id)))
    }
}
