//! Bulk import of ledger transactions from uploaded CSV files.
//!
//! The school office keeps spreadsheets of deposits collected in class.
//! Admins upload them as CSV and each row becomes a transaction on the
//! named student's account.

pub mod import_endpoint;
pub mod import_page;

pub use import_endpoint::import_transactions_endpoint;
pub use import_page::get_import_page;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState,
    ledger::{RetentionPolicy, dates::DateParser},
    notify::NotificationPublisher,
};

/// The state needed for importing transactions from CSV files.
#[derive(Clone)]
pub struct ImportState {
    /// The database connection for loading and saving accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How dates in CSV rows are parsed.
    pub date_parser: DateParser,
    /// How many ledger entries to keep per account.
    pub retention: RetentionPolicy,
    /// Where balance-change events are published.
    pub publisher: Arc<dyn NotificationPublisher>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            date_parser: state.date_parser.clone(),
            retention: state.retention.clone(),
            publisher: state.publisher.clone(),
        }
    }
}
