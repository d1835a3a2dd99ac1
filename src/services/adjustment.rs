//! Inventory adjustment planning
//!
//! Pure bookkeeping for the borrow workflow: given the current stock of the
//! books involved, compute the availability deltas a line-item operation
//! requires, or reject it. Planning never touches the database; the borrow
//! details service applies a plan inside one transaction with conditional
//! UPDATEs, so a plan that was valid against the snapshot is re-validated
//! under the row locks at write time.

use std::collections::BTreeMap;

use crate::{
    error::AppError,
    models::{book::Book, borrow::BorrowStatus},
};

/// Snapshot of one book's stock counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookStock {
    pub book_id: i64,
    /// Total copies owned
    pub quantity: i32,
    /// Copies currently available
    pub available: i32,
}

impl From<&Book> for BookStock {
    fn from(book: &Book) -> Self {
        Self {
            book_id: book.id,
            quantity: book.quantity,
            available: book.quantity_available,
        }
    }
}

/// One availability delta to apply to a book.
/// Negative `delta` debits availability (copies go out), positive credits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub book_id: i64,
    pub delta: i32,
}

impl StockAdjustment {
    pub fn debit(book_id: i64, quantity: i32) -> Self {
        Self { book_id, delta: -quantity }
    }

    pub fn credit(book_id: i64, quantity: i32) -> Self {
        Self { book_id, delta: quantity }
    }
}

/// Why a plan was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjustmentError {
    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i32),

    #[error("Book {book_id} has {available} copies available, {requested} requested")]
    InsufficientStock {
        book_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("Crediting {quantity} copies to book {book_id} would exceed its total quantity")]
    ExceedsTotal { book_id: i64, quantity: i32 },

    #[error("Book {0} is not part of the stock snapshot")]
    UnknownBook(i64),
}

impl From<AdjustmentError> for AppError {
    fn from(err: AdjustmentError) -> Self {
        match err {
            AdjustmentError::InvalidQuantity(_) => AppError::InvalidQuantity(err.to_string()),
            AdjustmentError::InsufficientStock { .. } => {
                AppError::InsufficientStock(err.to_string())
            }
            AdjustmentError::ExceedsTotal { .. } => AppError::InvariantViolation(err.to_string()),
            AdjustmentError::UnknownBook(_) => AppError::NotFound(err.to_string()),
        }
    }
}

/// Apply an adjustment to an in-memory snapshot, enforcing
/// `0 <= available <= quantity`.
pub fn apply(stock: &mut BookStock, adjustment: &StockAdjustment) -> Result<(), AdjustmentError> {
    let next = stock.available + adjustment.delta;
    if next < 0 {
        return Err(AdjustmentError::InsufficientStock {
            book_id: stock.book_id,
            requested: -adjustment.delta,
            available: stock.available,
        });
    }
    if next > stock.quantity {
        return Err(AdjustmentError::ExceedsTotal {
            book_id: stock.book_id,
            quantity: adjustment.delta,
        });
    }
    stock.available = next;
    Ok(())
}

/// Plan borrowing `quantity` copies of one book
pub fn plan_borrow(stock: &BookStock, quantity: i32) -> Result<StockAdjustment, AdjustmentError> {
    if quantity <= 0 {
        return Err(AdjustmentError::InvalidQuantity(quantity));
    }
    if stock.available < quantity {
        return Err(AdjustmentError::InsufficientStock {
            book_id: stock.book_id,
            requested: quantity,
            available: stock.available,
        });
    }
    Ok(StockAdjustment::debit(stock.book_id, quantity))
}

/// Plan a batch of borrow lines against one stock snapshot.
///
/// Requests are validated in order against the snapshot, so several lines
/// for the same book accumulate. Any rejection rejects the whole batch.
/// On success the returned plan has one debit per request, in input order.
pub fn plan_borrow_batch(
    stocks: &mut BTreeMap<i64, BookStock>,
    requests: &[(i64, i32)],
) -> Result<Vec<StockAdjustment>, AdjustmentError> {
    let mut plan = Vec::with_capacity(requests.len());
    for &(book_id, quantity) in requests {
        let stock = stocks
            .get_mut(&book_id)
            .ok_or(AdjustmentError::UnknownBook(book_id))?;
        let adjustment = plan_borrow(stock, quantity)?;
        apply(stock, &adjustment)?;
        plan.push(adjustment);
    }
    Ok(plan)
}

/// Plan a line-item update.
///
/// * Book change: credit the old book by the old quantity, then debit the
///   new book by the new quantity; the status argument has no further
///   inventory effect.
/// * Same book, outstanding ("MUON"): debit the positive quantity delta or
///   credit the negative one.
/// * Returned ("DA TRA"): credit the quantity delta back.
/// * Pending: no inventory effect.
pub fn plan_update(
    current: &BookStock,
    replacement: Option<&BookStock>,
    old_quantity: i32,
    new_quantity: i32,
    status: BorrowStatus,
) -> Result<Vec<StockAdjustment>, AdjustmentError> {
    if new_quantity <= 0 {
        return Err(AdjustmentError::InvalidQuantity(new_quantity));
    }

    let mut plan = Vec::new();

    match replacement {
        Some(next) if next.book_id != current.book_id => {
            plan.push(StockAdjustment::credit(current.book_id, old_quantity));
            if next.available < new_quantity {
                return Err(AdjustmentError::InsufficientStock {
                    book_id: next.book_id,
                    requested: new_quantity,
                    available: next.available,
                });
            }
            plan.push(StockAdjustment::debit(next.book_id, new_quantity));
        }
        _ => {
            let delta = new_quantity - old_quantity;
            match status {
                BorrowStatus::Outstanding => {
                    if delta > 0 && current.available < delta {
                        return Err(AdjustmentError::InsufficientStock {
                            book_id: current.book_id,
                            requested: delta,
                            available: current.available,
                        });
                    }
                    if delta != 0 {
                        plan.push(StockAdjustment {
                            book_id: current.book_id,
                            delta: -delta,
                        });
                    }
                }
                BorrowStatus::Returned => {
                    if delta != 0 {
                        plan.push(StockAdjustment {
                            book_id: current.book_id,
                            delta,
                        });
                    }
                }
                BorrowStatus::Pending => {}
            }
        }
    }

    Ok(plan)
}

/// Plan releasing a deleted line item's copies back to the shelf
pub fn plan_release(book_id: i64, quantity: i32) -> StockAdjustment {
    StockAdjustment::credit(book_id, quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(book_id: i64, quantity: i32, available: i32) -> BookStock {
        BookStock {
            book_id,
            quantity,
            available,
        }
    }

    #[test]
    fn borrow_debits_availability() {
        let mut b = stock(1, 5, 5);
        let adj = plan_borrow(&b, 3).unwrap();
        apply(&mut b, &adj).unwrap();
        assert_eq!(b.available, 2);
    }

    #[test]
    fn borrow_rejects_non_positive_quantity() {
        let b = stock(1, 5, 5);
        assert_eq!(plan_borrow(&b, 0), Err(AdjustmentError::InvalidQuantity(0)));
        assert_eq!(plan_borrow(&b, -2), Err(AdjustmentError::InvalidQuantity(-2)));
    }

    #[test]
    fn borrow_exact_stock_leaves_zero() {
        let mut b = stock(1, 4, 4);
        let adj = plan_borrow(&b, 4).unwrap();
        apply(&mut b, &adj).unwrap();
        assert_eq!(b.available, 0);
    }

    #[test]
    fn borrow_one_more_than_stock_fails_and_leaves_state() {
        let b = stock(1, 4, 4);
        let err = plan_borrow(&b, 5).unwrap_err();
        assert_eq!(
            err,
            AdjustmentError::InsufficientStock {
                book_id: 1,
                requested: 5,
                available: 4
            }
        );
        // No adjustment produced, snapshot untouched
        assert_eq!(b.available, 4);
    }

    // Scenario: two borrows against the same book, the second over-asks
    #[test]
    fn sequential_borrows_see_depleted_stock() {
        let mut b = stock(7, 5, 5);
        let first = plan_borrow(&b, 3).unwrap();
        apply(&mut b, &first).unwrap();
        assert_eq!(b.available, 2);

        let err = plan_borrow(&b, 3).unwrap_err();
        assert!(matches!(err, AdjustmentError::InsufficientStock { available: 2, .. }));
        assert_eq!(b.available, 2);
    }

    #[test]
    fn borrow_then_release_restores_availability_exactly() {
        let mut b = stock(1, 5, 5);
        let adj = plan_borrow(&b, 2).unwrap();
        apply(&mut b, &adj).unwrap();
        assert_eq!(b.available, 3);

        apply(&mut b, &plan_release(1, 2)).unwrap();
        assert_eq!(b.available, 5);
    }

    #[test]
    fn release_never_exceeds_total() {
        let mut b = stock(1, 5, 5);
        let err = apply(&mut b, &plan_release(1, 1)).unwrap_err();
        assert_eq!(
            err,
            AdjustmentError::ExceedsTotal {
                book_id: 1,
                quantity: 1
            }
        );
        assert_eq!(b.available, 5);
    }

    #[test]
    fn batch_plans_one_debit_per_request_in_order() {
        let mut stocks = BTreeMap::from([(1, stock(1, 5, 5)), (2, stock(2, 3, 3))]);
        let plan = plan_borrow_batch(&mut stocks, &[(1, 2), (2, 1), (1, 3)]).unwrap();
        assert_eq!(
            plan,
            vec![
                StockAdjustment::debit(1, 2),
                StockAdjustment::debit(2, 1),
                StockAdjustment::debit(1, 3),
            ]
        );
        assert_eq!(stocks[&1].available, 0);
        assert_eq!(stocks[&2].available, 2);
    }

    // Scenario: one invalid request among valid ones fails the whole batch
    #[test]
    fn batch_with_one_bad_request_yields_no_plan() {
        let mut stocks = BTreeMap::from([(1, stock(1, 5, 5)), (2, stock(2, 3, 3))]);
        let err = plan_borrow_batch(&mut stocks, &[(1, 2), (2, 4), (1, 1)]).unwrap_err();
        assert!(matches!(err, AdjustmentError::InsufficientStock { book_id: 2, .. }));
    }

    #[test]
    fn batch_accumulates_lines_for_the_same_book() {
        let mut stocks = BTreeMap::from([(1, stock(1, 5, 5))]);
        let err = plan_borrow_batch(&mut stocks, &[(1, 3), (1, 3)]).unwrap_err();
        assert!(matches!(
            err,
            AdjustmentError::InsufficientStock {
                book_id: 1,
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn batch_rejects_unknown_book() {
        let mut stocks = BTreeMap::from([(1, stock(1, 5, 5))]);
        let err = plan_borrow_batch(&mut stocks, &[(9, 1)]).unwrap_err();
        assert_eq!(err, AdjustmentError::UnknownBook(9));
    }

    #[test]
    fn update_outstanding_debits_positive_delta() {
        let b = stock(1, 5, 2);
        let plan = plan_update(&b, None, 3, 5, BorrowStatus::Outstanding).unwrap();
        assert_eq!(plan, vec![StockAdjustment::debit(1, 2)]);
    }

    #[test]
    fn update_outstanding_credits_negative_delta() {
        let b = stock(1, 5, 2);
        let plan = plan_update(&b, None, 3, 1, BorrowStatus::Outstanding).unwrap();
        assert_eq!(plan, vec![StockAdjustment::credit(1, 2)]);
    }

    #[test]
    fn update_outstanding_rejects_uncovered_delta() {
        let b = stock(1, 5, 1);
        let err = plan_update(&b, None, 3, 5, BorrowStatus::Outstanding).unwrap_err();
        assert!(matches!(
            err,
            AdjustmentError::InsufficientStock {
                book_id: 1,
                requested: 2,
                available: 1
            }
        ));
    }

    // Scenario: returning with a raised quantity credits the delta back
    #[test]
    fn update_returned_credits_quantity_delta() {
        let mut b = stock(1, 5, 2);
        let plan = plan_update(&b, None, 3, 5, BorrowStatus::Returned).unwrap();
        assert_eq!(plan, vec![StockAdjustment::credit(1, 2)]);
        for adj in &plan {
            apply(&mut b, adj).unwrap();
        }
        assert_eq!(b.available, 4);
    }

    // Scenario: returning with a lowered quantity debits the difference,
    // the delta is signed, not an unconditional credit
    #[test]
    fn update_returned_with_lower_quantity_debits_the_difference() {
        let mut b = stock(1, 5, 2);
        let plan = plan_update(&b, None, 3, 1, BorrowStatus::Returned).unwrap();
        assert_eq!(plan, vec![StockAdjustment { book_id: 1, delta: -2 }]);
        for adj in &plan {
            apply(&mut b, adj).unwrap();
        }
        assert_eq!(b.available, 0);
    }

    #[test]
    fn update_unchanged_quantity_plans_nothing() {
        let b = stock(1, 5, 2);
        assert!(plan_update(&b, None, 3, 3, BorrowStatus::Outstanding)
            .unwrap()
            .is_empty());
        assert!(plan_update(&b, None, 3, 3, BorrowStatus::Returned)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn update_pending_has_no_inventory_effect() {
        let b = stock(1, 5, 2);
        assert!(plan_update(&b, None, 3, 5, BorrowStatus::Pending)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn update_book_change_credits_old_and_debits_new() {
        let old = stock(1, 5, 2);
        let new = stock(2, 4, 4);
        let plan = plan_update(&old, Some(&new), 3, 2, BorrowStatus::Outstanding).unwrap();
        assert_eq!(
            plan,
            vec![StockAdjustment::credit(1, 3), StockAdjustment::debit(2, 2)]
        );
    }

    #[test]
    fn update_book_change_rejects_uncovered_new_book() {
        let old = stock(1, 5, 2);
        let new = stock(2, 4, 1);
        let err = plan_update(&old, Some(&new), 3, 2, BorrowStatus::Outstanding).unwrap_err();
        assert!(matches!(err, AdjustmentError::InsufficientStock { book_id: 2, .. }));
    }

    #[test]
    fn update_same_book_replacement_falls_back_to_delta_rules() {
        let b = stock(1, 5, 2);
        let plan = plan_update(&b, Some(&b), 3, 4, BorrowStatus::Outstanding).unwrap();
        assert_eq!(plan, vec![StockAdjustment::debit(1, 1)]);
    }

    #[test]
    fn update_rejects_non_positive_quantity() {
        let b = stock(1, 5, 2);
        let err = plan_update(&b, None, 3, 0, BorrowStatus::Outstanding).unwrap_err();
        assert_eq!(err, AdjustmentError::InvalidQuantity(0));
    }

    #[test]
    fn availability_stays_within_bounds_under_mixed_adjustments() {
        let mut b = stock(1, 5, 5);
        let steps = [
            StockAdjustment::debit(1, 4),
            StockAdjustment::credit(1, 2),
            StockAdjustment::debit(1, 3),
            StockAdjustment::credit(1, 5),
        ];
        for adj in &steps {
            let _ = apply(&mut b, adj);
            assert!(b.available >= 0 && b.available <= b.quantity);
        }
    }
}
