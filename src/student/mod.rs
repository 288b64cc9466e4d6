//! Student account management: the paginated account list, account
//! creation with optional old-code cloning, detail/ledger display, and
//! account edit/delete endpoints.

pub mod create;
pub mod delete_endpoint;
pub mod edit;
pub mod ledger_page;
pub mod students_page;

pub use create::{create_student_endpoint, get_new_student_page};
pub use delete_endpoint::delete_student_endpoint;
pub use edit::{get_edit_student_page, update_student_endpoint};
pub use ledger_page::get_student_ledger_page;
pub use students_page::get_students_page;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState, ledger::dates::DateParser, pagination::PaginationConfig, session::AcademicSession,
};

/// The state shared by the student pages and endpoints.
#[derive(Debug, Clone)]
pub struct StudentState {
    /// The database connection for loading and saving accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of students.
    pub pagination_config: PaginationConfig,
    /// The session applied to new accounts that do not specify one.
    pub default_session: AcademicSession,
    /// How dates in transaction forms are parsed.
    pub date_parser: DateParser,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for StudentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            default_session: state.default_session.clone(),
            date_parser: state.date_parser.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
