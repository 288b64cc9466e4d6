use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use bursar::{
    AppState, PaginationConfig, build_router, graceful_shutdown,
    ledger::{DateOrder, DateParser, RetentionPolicy},
    session::{AcademicSession, DEFAULT_ACADEMIC_SESSION},
};

/// The web server for the bursar student bank.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The local timezone as a canonical timezone name.
    #[arg(long, default_value = "Europe/London")]
    timezone: String,

    /// The academic session applied to new accounts and untagged
    /// transactions, e.g. "2025-26".
    #[arg(long, default_value = DEFAULT_ACADEMIC_SESSION)]
    default_session: String,

    /// Parse slash dates as month/day/year instead of day/month/year.
    #[arg(long, default_value_t = false)]
    month_first: bool,

    /// The maximum number of ledger entries to keep per account, oldest
    /// dropped first. Keeps everything when not set.
    #[arg(long)]
    max_ledger_entries: Option<usize>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");
    let admin_password = env::var("ADMIN_PASSWORD")
        .expect("The environment variable 'ADMIN_PASSWORD' must be set");
    let admin_password_hash = bcrypt::hash(&admin_password, bcrypt::DEFAULT_COST)
        .expect("Could not hash the admin password");

    let default_session =
        AcademicSession::new(&args.default_session).expect("Invalid default session");
    let date_parser = DateParser::new(if args.month_first {
        DateOrder::MonthFirst
    } else {
        DateOrder::DayFirst
    });
    let retention = RetentionPolicy {
        max_entries: args.max_ledger_entries,
    };

    let conn = Connection::open(&args.db_path).unwrap();
    let app_state = AppState::new(
        conn,
        &secret,
        admin_password_hash,
        &args.timezone,
        default_session,
        date_parser,
        retention,
        PaginationConfig::default(),
    )
    .expect("Could not initialise the database");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(app_state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
