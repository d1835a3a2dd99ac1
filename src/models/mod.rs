//! Data models for Biblios

pub mod book;
pub mod borrow;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use borrow::{Borrow, BorrowDetail, BorrowStatus, BorrowWithDetails};
pub use user::{Role, User};
