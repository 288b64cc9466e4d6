//! Transaction endpoints: recording deposits and withdrawals, editing and
//! deleting individual ledger entries, and CSV export.

pub mod delete_endpoint;
pub mod edit;
pub mod export;
pub mod record_endpoint;

pub use delete_endpoint::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use export::export_ledger_endpoint;
pub use record_endpoint::create_transaction_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState,
    ledger::{RetentionPolicy, dates::DateParser},
    notify::NotificationPublisher,
    session::AcademicSession,
};

/// The state shared by the transaction pages and endpoints.
#[derive(Clone)]
pub struct TxnState {
    /// The database connection for loading and saving accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How dates in transaction forms are parsed.
    pub date_parser: DateParser,
    /// How many ledger entries to keep per account.
    pub retention: RetentionPolicy,
    /// The session applied to transactions that do not specify one.
    pub default_session: AcademicSession,
    /// Where balance-change events are published.
    pub publisher: Arc<dyn NotificationPublisher>,
}

impl FromRef<AppState> for TxnState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            date_parser: state.date_parser.clone(),
            retention: state.retention.clone(),
            default_session: state.default_session.clone(),
            publisher: state.publisher.clone(),
        }
    }
}
