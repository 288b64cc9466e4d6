//! The landing page for logged in admins: totals across the whole student
//! bank, overall and per academic session.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        PAGE_CONTAINER_STYLE, SESSION_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency, link,
    },
    ledger::{
        Account, AccountQuery, AccountStore, engine::compute_balance, sqlite::SqliteAccountStore,
    },
    navigation::NavBar,
    session::{AcademicSession, SessionFilter},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for loading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The money held for one academic session across all accounts.
struct SessionTotal {
    session: AcademicSession,
    total: f64,
}

/// Display a page with an overview of the student bank.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let store = SqliteAccountStore::new(state.db_connection.clone());

    let summaries = store
        .list(&AccountQuery::default())
        .inspect_err(|error| tracing::error!("could not list accounts: {error}"))?;

    // The listing omits transaction lists, which the per-session totals
    // need, so fetch each account in full.
    let mut accounts = Vec::with_capacity(summaries.len());
    for summary in summaries {
        accounts.push(store.get(summary.id)?);
    }

    if accounts.is_empty() {
        return Ok(dashboard_no_data_view().into_response());
    }

    let sessions = store
        .sessions()
        .inspect_err(|error| tracing::error!("could not list sessions: {error}"))?;

    let total_balance: f64 = accounts.iter().map(|account| account.balance).sum();
    let session_totals: Vec<SessionTotal> = sessions
        .into_iter()
        .map(|session| {
            let filter = SessionFilter::Year(session.clone());
            let total = accounts
                .iter()
                .map(|account| compute_balance(account, &filter))
                .sum();

            SessionTotal { session, total }
        })
        .collect();

    Ok(dashboard_view(&accounts, total_balance, &session_totals).into_response())
}

fn summary_card(label: &str, value: &str) -> Markup {
    html! {
        div class="p-4 rounded-lg bg-gray-50 dark:bg-gray-800"
        {
            p class="text-sm text-gray-600 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold" { (value) }
        }
    }
}

fn dashboard_view(
    accounts: &[Account],
    total_balance: f64,
    session_totals: &[SessionTotal],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let transaction_count: usize = accounts
        .iter()
        .map(|account| account.transactions.len())
        .sum();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Dashboard" }

            div class="grid grid-cols-1 md:grid-cols-3 gap-4 mb-8"
            {
                (summary_card("Students", &accounts.len().to_string()))
                (summary_card("Money held", &format_currency(total_balance)))
                (summary_card("Ledger entries", &transaction_count.to_string()))
            }

            h2 class="text-xl font-semibold mb-4" { "Totals by session" }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Session" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                    }
                }

                tbody
                {
                    @for session_total in session_totals {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class=(SESSION_BADGE_STYLE) { (session_total.session) }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(session_total.total)) }
                        }
                    }
                }
            }
        }
    };

    base("Dashboard", &[], &content)
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_student_link = link(endpoints::NEW_STUDENT_VIEW, "adding a student");
    let import_link = link(endpoints::IMPORT_VIEW, "importing a spreadsheet");

    let content = html! {
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Totals will show up here once there are student accounts. Start by "
                (new_student_link) " or by " (import_link) "."
            }
        }
    };

    base("Dashboard", &[], &content)
}
