//! Books repository for database operations
//!
//! Besides plain CRUD on the pool, this module exposes transaction-scoped
//! helpers (`tx_*`) used by the borrow details service. Availability updates
//! are conditional in SQL so that two requests racing for the same copies
//! cannot both succeed: the row lock taken by the first UPDATE forces the
//! second to re-evaluate the WHERE clause after commit.

use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

/// Get a book inside an open transaction
pub async fn tx_get_by_id(tx: &mut Transaction<'_, Postgres>, id: i64) -> AppResult<Book> {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
}

/// Debit `quantity` copies from a book's availability.
///
/// Returns false when the book cannot cover the debit; nothing is written
/// in that case. The caller has already established the row exists.
pub async fn tx_debit_available(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i64,
    quantity: i32,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET quantity_available = quantity_available - $1
        WHERE id = $2 AND quantity_available >= $1
        "#,
    )
    .bind(quantity)
    .bind(book_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Credit `quantity` copies back to a book's availability.
///
/// Returns false when the credit would push availability above the total
/// quantity; nothing is written in that case.
pub async fn tx_credit_available(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i64,
    quantity: i32,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET quantity_available = quantity_available + $1
        WHERE id = $2 AND quantity_available + $1 <= quantity
        "#,
    )
    .bind(quantity)
    .bind(book_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with optional title search and pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let pattern = query
            .title
            .as_deref()
            .map(|t| format!("%{}%", t))
            .unwrap_or_else(|| "%".to_string());

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE title ILIKE $1
            ORDER BY title
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Create a new book; availability starts equal to the total quantity
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author_id, category_id, publisher_id,
                year_published, price, language, description,
                quantity, quantity_available, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.category_id)
        .bind(book.publisher_id)
        .bind(book.year_published)
        .bind(book.price)
        .bind(&book.language)
        .bind(&book.description)
        .bind(book.quantity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book.
    ///
    /// A total-quantity change shifts availability by the same delta so the
    /// copies out on loan stay accounted for. The WHERE clause rejects an
    /// update that would drive availability negative.
    pub async fn update(&self, id: i64, book: &UpdateBook) -> AppResult<Book> {
        let current = self.get_by_id(id).await?;

        let new_quantity = book.quantity.unwrap_or(current.quantity);
        let quantity_delta = new_quantity - current.quantity;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, category_id = $3, publisher_id = $4,
                year_published = $5, price = $6, language = $7, description = $8,
                quantity = $9, quantity_available = quantity_available + $10
            WHERE id = $11 AND quantity_available + $10 >= 0
            RETURNING *
            "#,
        )
        .bind(book.title.as_deref().unwrap_or(&current.title))
        .bind(book.author_id.or(current.author_id))
        .bind(book.category_id.or(current.category_id))
        .bind(book.publisher_id.or(current.publisher_id))
        .bind(book.year_published.unwrap_or(current.year_published))
        .bind(book.price.unwrap_or(current.price))
        .bind(book.language.as_deref().or(current.language.as_deref()))
        .bind(book.description.as_deref().or(current.description.as_deref()))
        .bind(new_quantity)
        .bind(quantity_delta)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Cannot reduce quantity of book {} below the copies currently borrowed",
                id
            ))
        })?;

        Ok(updated)
    }

    /// Delete a book; refused while borrow lines still reference it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.get_by_id(id).await?;

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrow_details WHERE book_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if referenced {
            return Err(AppError::Conflict(format!(
                "Book {} is referenced by borrow records",
                id
            )));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
