//! Implements a struct that holds the state of the web server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::cookie::DEFAULT_COOKIE_DURATION,
    ledger::{RetentionPolicy, dates::DateParser, sqlite::initialize},
    notify::{NotificationPublisher, TracingPublisher},
    pagination::PaginationConfig,
    session::AcademicSession,
};

/// The state of the web server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The bcrypt hash of the admin password.
    pub admin_password_hash: String,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The session applied to new transactions that do not specify one.
    pub default_session: AcademicSession,

    /// How dates in CSV imports and forms are parsed.
    pub date_parser: DateParser,

    /// How many ledger entries to keep per account.
    pub retention: RetentionPolicy,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// Where balance-change events are published.
    pub publisher: Arc<dyn NotificationPublisher>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    /// Events are published to the application log; use [AppState::with_publisher]
    /// to send them elsewhere.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        admin_password_hash: String,
        local_timezone: &str,
        default_session: AcademicSession,
        date_parser: DateParser,
        retention: RetentionPolicy,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            admin_password_hash,
            local_timezone: local_timezone.to_owned(),
            default_session,
            date_parser,
            retention,
            pagination_config,
            publisher: Arc::new(TracingPublisher),
            db_connection: connection,
        })
    }

    /// Replace the notification publisher.
    pub fn with_publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publisher = publisher;
        self
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
