//! The ledger is the heart of the application: student accounts, their
//! transactions, balance computation, and bulk import.

pub mod account;
pub mod dates;
pub mod engine;
pub mod import;
pub mod sqlite;
pub mod store;
pub mod transaction;

pub use account::{Account, AccountId, AccountQuery, NewAccount};
pub use dates::{DateOrder, DateParser};
pub use engine::RetentionPolicy;
pub use import::{ImportRow, ImportSummary, RowFailure};
pub use store::AccountStore;
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionKind, TransactionPatch,
};
