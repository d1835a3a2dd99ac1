//! Borrow transaction service
//!
//! Owns the transaction headers and keeps their status consistent with the
//! line-item operations. Deleting a borrow is an explicit two-phase
//! operation: every line item's inventory effect is reversed before the
//! header goes, all inside one database transaction.

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{
        Borrow, BorrowDetail, BorrowStatus, BorrowWithDetails, CreateBorrow, UpdateBorrow,
    },
    repository::{borrow_details, borrows, Repository},
    services::{adjustment, borrow_details::apply_adjustment},
};

fn check_dates(borrow_date: NaiveDate, due_date: Option<NaiveDate>) -> AppResult<()> {
    if let Some(due) = due_date {
        if due < borrow_date {
            return Err(AppError::Validation(
                "Due date must not be before borrow date".to_string(),
            ));
        }
    }
    Ok(())
}

/// Assemble a borrow aggregate from its header and the line-item fetch
/// outcome. A failed fetch must not abort the read; the aggregate gets an
/// empty list and the error goes to the log.
fn with_details_or_empty(
    borrow: Borrow,
    details: AppResult<Vec<BorrowDetail>>,
) -> BorrowWithDetails {
    let details = match details {
        Ok(details) => details,
        Err(e) => {
            tracing::error!(
                borrow_id = borrow.id,
                error = %e,
                "Failed to load borrow details, substituting empty list"
            );
            Vec::new()
        }
    };
    BorrowWithDetails::from_parts(borrow, details)
}

/// A header status change moves no inventory, so line items still holding
/// copies keep their debits after the flip. Worth flagging to the operator.
fn status_change_leaves_holdings(old: BorrowStatus, new: BorrowStatus, line_items: usize) -> bool {
    old != new && line_items > 0
}

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all borrows with their line items.
    ///
    /// A failure loading one borrow's line items must not abort the whole
    /// listing; the bad aggregate gets an empty list and the error goes to
    /// the log.
    pub async fn list(&self) -> AppResult<Vec<BorrowWithDetails>> {
        let borrows = self.repository.borrows.list().await?;

        let mut result = Vec::with_capacity(borrows.len());
        for borrow in borrows {
            let details = self.repository.borrow_details.list_by_borrow(borrow.id).await;
            result.push(with_details_or_empty(borrow, details));
        }

        Ok(result)
    }

    /// Get one borrow with its line items
    pub async fn get(&self, id: i64) -> AppResult<BorrowWithDetails> {
        let borrow = self.repository.borrows.get_by_id(id).await?;
        let details = self.repository.borrow_details.list_by_borrow(borrow.id).await;
        Ok(with_details_or_empty(borrow, details))
    }

    /// Create a new borrow transaction (header only; line items are added
    /// through the borrow-details operations)
    pub async fn create(&self, request: CreateBorrow) -> AppResult<i64> {
        // Verify the borrower exists
        self.repository.users.get_by_id(request.user_id).await?;

        let borrow_date = request
            .borrow_date
            .unwrap_or_else(|| Utc::now().date_naive());
        check_dates(borrow_date, request.due_date)?;

        let status = request.status.unwrap_or(BorrowStatus::Outstanding);

        let id = self
            .repository
            .borrows
            .create(
                request.user_id,
                borrow_date,
                request.due_date,
                request.actual_return_date,
                status,
            )
            .await?;

        tracing::debug!(borrow_id = id, user_id = request.user_id, "Created borrow");

        Ok(id)
    }

    /// Update a borrow header. The status may be set freely here; inventory
    /// effects only follow from line-item operations.
    pub async fn update(&self, id: i64, request: UpdateBorrow) -> AppResult<Borrow> {
        let current = self.repository.borrows.get_by_id(id).await?;

        let borrow_date = request.borrow_date.unwrap_or(current.borrow_date);
        let due_date = request.due_date.or(current.due_date);
        let actual_return_date = request.actual_return_date.or(current.actual_return_date);
        let status = request.status.unwrap_or(current.status);

        check_dates(borrow_date, due_date)?;

        if status != current.status {
            let line_items = self
                .repository
                .borrow_details
                .list_by_borrow(id)
                .await?
                .len();
            if status_change_leaves_holdings(current.status, status, line_items) {
                tracing::warn!(
                    borrow_id = id,
                    line_items,
                    old_status = %current.status,
                    new_status = %status,
                    "Borrow status changed while line items still hold copies"
                );
            }
        }

        self.repository
            .borrows
            .update(id, borrow_date, due_date, actual_return_date, status)
            .await?;

        self.repository.borrows.get_by_id(id).await
    }

    /// Delete a borrow and all of its line items.
    ///
    /// Phase one credits every line item's copies back to its book, phase
    /// two removes the rows. One transaction, so a credit that cannot be
    /// applied aborts the whole deletion.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        borrows::tx_get_by_id(&mut tx, id).await?;
        let details = borrow_details::tx_list_by_borrow(&mut tx, id).await?;

        for detail in &details {
            let release = adjustment::plan_release(detail.book_id, detail.quantity);
            apply_adjustment(&mut tx, &release).await?;
            borrow_details::tx_delete(&mut tx, detail.id).await?;
        }

        borrows::tx_delete(&mut tx, id).await?;

        tx.commit().await?;

        tracing::debug!(borrow_id = id, line_items = details.len(), "Deleted borrow");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: i64) -> Borrow {
        Borrow {
            id,
            user_id: 1,
            borrow_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            due_date: None,
            actual_return_date: None,
            status: BorrowStatus::Outstanding,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn aggregate_carries_fetched_line_items() {
        let details = vec![BorrowDetail {
            id: 11,
            borrow_id: 7,
            book_id: 3,
            quantity: 2,
        }];
        let aggregate = with_details_or_empty(header(7), Ok(details));
        assert_eq!(aggregate.id, 7);
        assert_eq!(aggregate.details.len(), 1);
        assert_eq!(aggregate.details[0].book_id, 3);
    }

    #[test]
    fn aggregate_survives_failed_line_item_fetch() {
        let aggregate = with_details_or_empty(
            header(7),
            Err(AppError::Database(sqlx::Error::PoolClosed)),
        );
        assert_eq!(aggregate.id, 7);
        assert_eq!(aggregate.status, BorrowStatus::Outstanding);
        assert!(aggregate.details.is_empty());
    }

    #[test]
    fn status_flip_with_line_items_is_flagged() {
        assert!(status_change_leaves_holdings(
            BorrowStatus::Outstanding,
            BorrowStatus::Returned,
            2
        ));
    }

    #[test]
    fn status_flip_without_line_items_is_not_flagged() {
        assert!(!status_change_leaves_holdings(
            BorrowStatus::Outstanding,
            BorrowStatus::Returned,
            0
        ));
        assert!(!status_change_leaves_holdings(
            BorrowStatus::Returned,
            BorrowStatus::Returned,
            2
        ));
    }
}
