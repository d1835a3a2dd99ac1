//! Borrow (lending transaction) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Borrow transaction status.
///
/// Wire values keep the legacy strings used by the existing clients:
/// "MUON" (outstanding), "DA TRA" (returned), "PENDING".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BorrowStatus {
    #[serde(rename = "MUON")]
    Outstanding,
    #[serde(rename = "DA TRA")]
    Returned,
    #[serde(rename = "PENDING")]
    Pending,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Outstanding => "MUON",
            BorrowStatus::Returned => "DA TRA",
            BorrowStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MUON" => Ok(BorrowStatus::Outstanding),
            "DA TRA" => Ok(BorrowStatus::Returned),
            "PENDING" => Ok(BorrowStatus::Pending),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowStatus (stored as the legacy string)
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrow transaction header from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i64,
    pub user_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub actual_return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One book-and-quantity line within a borrow transaction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowDetail {
    pub id: i64,
    pub borrow_id: i64,
    pub book_id: i64,
    pub quantity: i32,
}

/// Borrow header together with its line items, for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowWithDetails {
    pub id: i64,
    pub user_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub actual_return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub details: Vec<BorrowDetail>,
}

impl BorrowWithDetails {
    pub fn from_parts(borrow: Borrow, details: Vec<BorrowDetail>) -> Self {
        Self {
            id: borrow.id,
            user_id: borrow.user_id,
            borrow_date: borrow.borrow_date,
            due_date: borrow.due_date,
            actual_return_date: borrow.actual_return_date,
            status: borrow.status,
            created_at: borrow.created_at,
            updated_at: borrow.updated_at,
            details,
        }
    }
}

/// Create borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrow {
    pub user_id: i64,
    /// Defaults to today when absent
    pub borrow_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub actual_return_date: Option<NaiveDate>,
    /// Defaults to MUON when absent
    pub status: Option<BorrowStatus>,
}

/// Update borrow request (header fields only; line items go through
/// the borrow-details endpoints)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrow {
    pub borrow_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub actual_return_date: Option<NaiveDate>,
    pub status: Option<BorrowStatus>,
}

/// Create borrow detail (line item) request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowDetail {
    pub borrow_id: i64,
    pub book_id: i64,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
}

/// Update borrow detail request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrowDetail {
    /// Replacement book, when the line is moved to another title
    pub book_id: Option<i64>,
    /// Replacement quantity; keeps the current one when absent
    pub quantity: Option<i32>,
}

/// Batch delete request for borrow details
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteBorrowDetails {
    pub ids: Vec<i64>,
}

/// Query parameters for listing borrow details
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowDetailQuery {
    pub borrow_id: i64,
}

/// Query parameters for the status argument on line-item updates
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowDetailUpdateQuery {
    /// "MUON" to keep borrowing, "DA TRA" to return copies
    pub status: String,
}
