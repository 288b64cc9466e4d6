//! Bursar is a web app for running a school student savings bank.
//!
//! Students have accounts with a cached running balance, deposits and
//! withdrawals are recorded as ledger transactions, and admins manage
//! everything through server-rendered HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod csv_import;
mod dashboard;
mod endpoints;
mod html;
pub mod ledger;
mod navigation;
mod not_found;
mod notify;
mod pagination;
mod routing;
pub mod session;
mod student;
#[cfg(test)]
mod test_utils;
mod timezone;
mod txn;

pub use app_state::{AppState, create_cookie_key};
pub use ledger::sqlite::initialize as initialize_db;
pub use notify::{NotificationPublisher, TracingPublisher};
pub use pagination::PaginationConfig;
pub use routing::build_router;

use crate::{
    alert::Alert,
    html::error_view,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction amount was zero, negative, or not a finite number.
    ///
    /// The string is the raw amount as the client supplied it, for error
    /// reporting.
    #[error("\"{0}\" is not a valid amount: amounts must be positive numbers")]
    InvalidAmount(String),

    /// A transaction type was neither a deposit nor a withdrawal.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidKind(String),

    /// An academic session tag was not in the form "2025-26".
    #[error("\"{0}\" is not a valid academic session, expected e.g. \"2025-26\"")]
    InvalidSession(String),

    /// A date string could not be parsed by any accepted format.
    #[error("could not parse \"{0}\" as a date")]
    InvalidDate(String),

    /// An empty string was used as a student code.
    #[error("student code cannot be empty")]
    EmptyStudentCode,

    /// The student code used to create an account already exists.
    #[error("a student with the code \"{0}\" already exists")]
    DuplicateStudentCode(String),

    /// The referenced student account does not exist.
    #[error("the student account could not be found")]
    AccountNotFound,

    /// The referenced ledger transaction does not exist on the account.
    #[error("the transaction could not be found on the account")]
    TransactionNotFound,

    /// The account was modified by another writer since it was read.
    ///
    /// Callers should re-read the account, re-apply their change, and try
    /// the write again.
    #[error("the account was modified concurrently, re-read and retry")]
    WriteConflict,

    /// A withdrawal would make the account balance negative.
    #[error("the withdrawal would overdraw the account")]
    InsufficientBalance,

    /// The admin provided an invalid password.
    #[error("invalid password")]
    InvalidCredentials,

    /// Either the session or expiry cookie is missing from the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing or formatting a cookie expiry date-time.
    #[error("could not parse or format the cookie expiry date-time")]
    DateError,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("file is not a CSV")]
    NotCsv,

    /// The CSV had issues that prevented it from being parsed.
    #[error("could not parse the CSV file: {0}")]
    InvalidCsv(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A balance-change notification could not be delivered.
    ///
    /// Publishing is best effort: callers log this and carry on, the ledger
    /// mutation that already happened is never rolled back.
    #[error("could not publish notification: {0}")]
    PublishFailed(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::AccountNotFound => get_404_not_found_response(),
            Error::InvalidTimezone(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_view(
                    "Server Error",
                    "500",
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings \
                        and ensure the timezone has been set to a valid, canonical timezone string."
                    ),
                ),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_view(
                        "Server Error",
                        "500",
                        "Sorry, something went wrong.",
                        "Try again later or check the server logs.",
                    ),
                )
                    .into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an htmx alert fragment with an appropriate
    /// status code, for endpoints whose errors are swapped into the page.
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidAmount(_)
            | Error::InvalidKind(_)
            | Error::InvalidSession(_)
            | Error::InvalidDate(_)
            | Error::EmptyStudentCode => Alert::ErrorSimple {
                message: self.to_string(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::DuplicateStudentCode(code) => Alert::Error {
                message: "Duplicate student code".to_owned(),
                details: format!(
                    "A student with the code {code} already exists. Choose a different code, \
                    or edit or delete the existing account."
                ),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InsufficientBalance => Alert::Error {
                message: "Insufficient balance".to_owned(),
                details: "The withdrawal would overdraw the account.".to_owned(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::AccountNotFound => Alert::Error {
                message: "Could not find student account".to_owned(),
                details: "Try refreshing the page to see if the account has been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::TransactionNotFound => Alert::Error {
                message: "Could not find transaction".to_owned(),
                details: "Try refreshing the page to see if the transaction has already been \
                    deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::WriteConflict => Alert::Error {
                message: "The account changed while you were editing".to_owned(),
                details: "Someone else saved a change to this account. Refresh the page and try \
                    again."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::CONFLICT),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                }
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
