//! Book model and related types
//!
//! A book row carries two counters: `quantity` is the number of copies the
//! library owns, `quantity_available` the number not currently held by an
//! outstanding borrow line. Once borrow workflows exist, only the inventory
//! adjustment path in the borrow details service may touch
//! `quantity_available`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Author identity, resolved by the catalog lookup services upstream
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub publisher_id: Option<i64>,
    pub year_published: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub language: Option<String>,
    pub description: Option<String>,
    /// Total copies owned
    pub quantity: i32,
    /// Copies not held by an outstanding borrow line
    pub quantity_available: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 1000, message = "Title must not be empty"))]
    pub title: String,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub publisher_id: Option<i64>,
    pub year_published: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub language: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 1000, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub publisher_id: Option<i64>,
    pub year_published: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub language: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: Option<i32>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
