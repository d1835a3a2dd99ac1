//! Borrow details (line item) service
//!
//! Each operation mutates the line item and the matching book availability
//! as one database transaction: the whole plan commits or nothing does.

use sqlx::{Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowDetail, BorrowStatus, CreateBorrowDetail, UpdateBorrowDetail},
    repository::{books, borrow_details, borrows, Repository},
    services::adjustment::{self, BookStock, StockAdjustment},
};

/// Apply one planned availability delta inside an open transaction.
///
/// The conditional UPDATE re-validates the plan under the row lock: a debit
/// that no longer fits is insufficient stock, a credit that no longer fits
/// means the stored counters drifted and must not be papered over.
pub(crate) async fn apply_adjustment(
    tx: &mut Transaction<'_, Postgres>,
    adjustment: &StockAdjustment,
) -> AppResult<()> {
    if adjustment.delta < 0 {
        let debit = -adjustment.delta;
        if !books::tx_debit_available(tx, adjustment.book_id, debit).await? {
            return Err(AppError::InsufficientStock(format!(
                "Book {} does not have {} copies available",
                adjustment.book_id, debit
            )));
        }
    } else if adjustment.delta > 0 {
        if !books::tx_credit_available(tx, adjustment.book_id, adjustment.delta).await? {
            return Err(AppError::InvariantViolation(format!(
                "crediting {} copies to book {} would exceed its total quantity",
                adjustment.delta, adjustment.book_id
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct BorrowDetailsService {
    repository: Repository,
}

impl BorrowDetailsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List line items for a borrow transaction
    pub async fn list(&self, borrow_id: i64) -> AppResult<Vec<BorrowDetail>> {
        self.repository.borrow_details.list_by_borrow(borrow_id).await
    }

    /// Create a line item, debiting the book's availability
    pub async fn create(&self, request: CreateBorrowDetail) -> AppResult<i64> {
        let mut tx = self.repository.pool.begin().await?;

        borrows::tx_get_by_id(&mut tx, request.borrow_id).await?;
        let book = books::tx_get_by_id(&mut tx, request.book_id).await?;

        let plan = adjustment::plan_borrow(&BookStock::from(&book), request.quantity)?;
        apply_adjustment(&mut tx, &plan).await?;

        let id = borrow_details::tx_insert(
            &mut tx,
            request.borrow_id,
            request.book_id,
            request.quantity,
        )
        .await?;

        tx.commit().await?;

        tracing::debug!(
            borrow_detail_id = id,
            borrow_id = request.borrow_id,
            book_id = request.book_id,
            quantity = request.quantity,
            "Created borrow detail"
        );

        Ok(id)
    }

    /// Create several line items as one atomic unit.
    ///
    /// Any rejection rolls back the whole batch. Returns the created ids in
    /// input order.
    pub async fn create_batch(&self, requests: Vec<CreateBorrowDetail>) -> AppResult<Vec<i64>> {
        if requests.is_empty() {
            return Err(AppError::Validation(
                "Borrow detail batch must not be empty".to_string(),
            ));
        }

        let mut tx = self.repository.pool.begin().await?;

        // Resolve every referenced borrow and book up front; validation runs
        // against one in-memory snapshot so same-book lines accumulate.
        let mut stocks = std::collections::BTreeMap::new();
        for request in &requests {
            borrows::tx_get_by_id(&mut tx, request.borrow_id).await?;
            if !stocks.contains_key(&request.book_id) {
                let book = books::tx_get_by_id(&mut tx, request.book_id).await?;
                stocks.insert(request.book_id, BookStock::from(&book));
            }
        }

        let lines: Vec<(i64, i32)> = requests
            .iter()
            .map(|r| (r.book_id, r.quantity))
            .collect();
        let plan = adjustment::plan_borrow_batch(&mut stocks, &lines)?;

        let mut ids = Vec::with_capacity(requests.len());
        for (request, adjustment) in requests.iter().zip(plan.iter()) {
            apply_adjustment(&mut tx, adjustment).await?;
            let id = borrow_details::tx_insert(
                &mut tx,
                request.borrow_id,
                request.book_id,
                request.quantity,
            )
            .await?;
            ids.push(id);
        }

        tx.commit().await?;

        tracing::debug!(count = ids.len(), "Created borrow detail batch");

        Ok(ids)
    }

    /// Update a line item's book and/or quantity under a status argument.
    ///
    /// "MUON" keeps the line outstanding and debits/credits the quantity
    /// delta; "DA TRA" credits the delta back and flips the borrow to
    /// returned. A book change credits the old title and debits the new one.
    pub async fn update(
        &self,
        id: i64,
        request: UpdateBorrowDetail,
        status: BorrowStatus,
    ) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let detail = borrow_details::tx_get_by_id(&mut tx, id).await?;
        let borrow = borrows::tx_get_by_id(&mut tx, detail.borrow_id).await?;
        let current_book = books::tx_get_by_id(&mut tx, detail.book_id).await?;

        let replacement_book = match request.book_id {
            Some(book_id) if book_id != detail.book_id => {
                Some(books::tx_get_by_id(&mut tx, book_id).await?)
            }
            _ => None,
        };

        let new_quantity = request.quantity.unwrap_or(detail.quantity);

        let replacement_stock = replacement_book.as_ref().map(BookStock::from);
        let plan = adjustment::plan_update(
            &BookStock::from(&current_book),
            replacement_stock.as_ref(),
            detail.quantity,
            new_quantity,
            status,
        )?;
        for step in &plan {
            apply_adjustment(&mut tx, step).await?;
        }

        let new_book_id = replacement_book.as_ref().map(|b| b.id).unwrap_or(detail.book_id);
        borrow_details::tx_update(&mut tx, id, new_book_id, new_quantity).await?;

        // Reconcile the governing transaction's status with the request
        if matches!(status, BorrowStatus::Outstanding | BorrowStatus::Returned)
            && borrow.status != status
        {
            borrows::tx_set_status(&mut tx, borrow.id, status).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            borrow_detail_id = id,
            book_id = new_book_id,
            quantity = new_quantity,
            status = %status,
            "Updated borrow detail"
        );

        Ok(())
    }

    /// Delete a line item, crediting its copies back to the shelf
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let detail = borrow_details::tx_get_by_id(&mut tx, id).await?;

        let release = adjustment::plan_release(detail.book_id, detail.quantity);
        apply_adjustment(&mut tx, &release).await?;
        borrow_details::tx_delete(&mut tx, id).await?;

        tx.commit().await?;

        tracing::debug!(borrow_detail_id = id, "Deleted borrow detail");

        Ok(())
    }

    /// Delete several line items as one atomic unit.
    ///
    /// If any id does not resolve, nothing is deleted.
    pub async fn delete_batch(&self, ids: Vec<i64>) -> AppResult<()> {
        if ids.is_empty() {
            return Err(AppError::Validation(
                "Borrow detail id list must not be empty".to_string(),
            ));
        }

        let mut unique_ids = ids.clone();
        unique_ids.sort_unstable();
        unique_ids.dedup();

        let mut tx = self.repository.pool.begin().await?;

        let details = borrow_details::tx_get_by_ids(&mut tx, &unique_ids).await?;
        if details.len() != unique_ids.len() {
            let found: std::collections::BTreeSet<i64> =
                details.iter().map(|d| d.id).collect();
            let missing: Vec<String> = unique_ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(AppError::PartialNotFound(format!(
                "Borrow details not found: {}",
                missing.join(", ")
            )));
        }

        for detail in &details {
            let release = adjustment::plan_release(detail.book_id, detail.quantity);
            apply_adjustment(&mut tx, &release).await?;
        }
        borrow_details::tx_delete_many(&mut tx, &unique_ids).await?;

        tx.commit().await?;

        tracing::debug!(count = unique_ids.len(), "Deleted borrow detail batch");

        Ok(())
    }
}
