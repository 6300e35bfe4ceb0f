//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its database functions
//! - Owner-scoped queries over date windows
//! - The JSON route handlers for creating, listing, summarizing, updating and deleting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod query;
mod summary;
mod window;

#[cfg(test)]
mod test_utils;

pub use core::{
    NewTransaction, Transaction, TransactionType, create_transaction, create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transactions, get_transactions_by_date};
pub use summary::{get_all_summary, get_today_summary};

#[cfg(test)]
pub use core::{count_transactions, get_transaction};
