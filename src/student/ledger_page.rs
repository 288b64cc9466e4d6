//! The per-student ledger page: the transaction history, the session
//! scoped balance, and the form for recording a deposit or withdrawal.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        SESSION_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    ledger::{
        Account, AccountId, AccountStore, Transaction, engine::compute_balance,
        sqlite::SqliteAccountStore,
    },
    navigation::NavBar,
    session::{AcademicSession, SessionFilter},
    student::StudentState,
    timezone::today_local,
};

/// The query parameters accepted by the ledger page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerQuery {
    /// A session tag to restrict the displayed balance, or "all".
    pub session: Option<String>,
}

/// Route handler for a student's ledger page.
pub async fn get_student_ledger_page(
    Path(account_id): Path<AccountId>,
    State(state): State<StudentState>,
    Query(query): Query<LedgerQuery>,
) -> Result<Response, Error> {
    let filter = SessionFilter::parse(query.session.as_deref())?;

    let store = SqliteAccountStore::new(state.db_connection.clone());
    let account = store.get(account_id).inspect_err(|error| match error {
        Error::AccountNotFound => {}
        error => {
            tracing::error!(
                "An unexpected error occurred when fetching account #{account_id}: {error}"
            );
        }
    })?;

    let sessions = store
        .sessions()
        .inspect_err(|error| tracing::error!("Failed to list academic sessions: {error}"))?;

    let today = today_local(&state.local_timezone)
        .inspect_err(|error| tracing::error!("Could not determine the local date: {error}"))?;

    Ok(ledger_view(&account, &filter, &sessions, today).into_response())
}

fn ledger_view(
    account: &Account,
    filter: &SessionFilter,
    sessions: &[AcademicSession],
    today: Date,
) -> Markup {
    let ledger_url = endpoints::format_endpoint(endpoints::STUDENT_LEDGER_VIEW, account.id);
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_STUDENT_VIEW, account.id);
    let export_url = endpoints::format_endpoint(endpoints::EXPORT_API, account.id);

    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();

    let filtered_balance = compute_balance(account, filter);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex flex-wrap items-center gap-4"
                {
                    @if let Some(profile_image) = &account.profile_image {
                        img
                            src=(profile_image)
                            alt=(account.name)
                            class="w-16 h-16 rounded-full object-cover";
                    }

                    div
                    {
                        h1 class="text-xl font-bold" { (account.name) }

                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (account.code)
                            " "
                            span class=(SESSION_BADGE_STYLE) { (account.academic_year) }
                        }
                    }

                    div class="ml-auto flex gap-4 text-sm"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit details" }
                        a href=(export_url) class=(LINK_STYLE) { "Export CSV" }
                    }
                }

                (balance_section(account, filter, filtered_balance, sessions, &ledger_url))

                section class="grid gap-8 lg:grid-cols-[20rem_1fr]"
                {
                    (transaction_form_view(account, today))
                    (transactions_table(account))
                }
            }
        }
    );

    base(&account.name, &[], &content)
}

fn balance_section(
    account: &Account,
    filter: &SessionFilter,
    filtered_balance: f64,
    sessions: &[AcademicSession],
    ledger_url: &str,
) -> Markup {
    html!(
        section class="flex flex-wrap items-end gap-6 p-4 rounded bg-white border
            border-gray-200 shadow-sm dark:bg-gray-800 dark:border-gray-700"
        {
            div
            {
                p class="text-xs uppercase text-gray-500 dark:text-gray-400"
                {
                    @match filter {
                        SessionFilter::All => "Balance (all sessions)",
                        SessionFilter::Year(_) => "Balance (filtered)",
                    }
                }

                p class="text-2xl font-bold" { (format_currency(filtered_balance)) }
            }

            @if *filter != SessionFilter::All {
                div
                {
                    p class="text-xs uppercase text-gray-500 dark:text-gray-400"
                    {
                        "All sessions"
                    }

                    p class="text-lg font-medium" { (format_currency(account.balance)) }
                }
            }

            form method="get" action=(ledger_url) class="ml-auto flex items-end gap-2"
            {
                select name="session" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="all" selected[*filter == SessionFilter::All]
                    {
                        "All sessions"
                    }

                    @for session in sessions {
                        option
                            value=(session)
                            selected[matches!(filter, SessionFilter::Year(selected) if selected == session)]
                        {
                            (session)
                        }
                    }
                }

                button
                    type="submit"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                        hover:dark:bg-blue-700 text-white text-sm rounded"
                {
                    "Apply"
                }
            }
        }
    )
}

/// The deposit/withdrawal form, posted to the transaction endpoint via
/// htmx.
fn transaction_form_view(account: &Account, today: Date) -> Markup {
    let record_endpoint = endpoints::format_endpoint(endpoints::TRANSACTIONS_API, account.id);

    html!(
        form
            hx-post=(record_endpoint)
            hx-target-error="#alert-container"
            class="space-y-4 p-4 rounded bg-white border border-gray-200 shadow-sm
                dark:bg-gray-800 dark:border-gray-700 h-fit"
        {
            h2 class="text-lg font-semibold" { "Record Transaction" }

            fieldset class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-2"
                {
                    input
                        id="kind-deposit"
                        type="radio"
                        name="kind"
                        value="deposit"
                        checked
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-deposit" class=(FORM_RADIO_LABEL_STYLE) { "Deposit" }
                }

                div class="flex items-center gap-2"
                {
                    input
                        id="kind-withdraw"
                        type="radio"
                        name="kind"
                        value="withdraw"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-withdraw" class=(FORM_RADIO_LABEL_STYLE) { "Withdraw" }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    min="0"
                    step="0.01"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(today)
                    max=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="reason" class=(FORM_LABEL_STYLE) { "Reason" }

                input
                    id="reason"
                    type="text"
                    name="reason"
                    placeholder="e.g., trip money"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="session" class=(FORM_LABEL_STYLE) { "Academic session" }

                input
                    id="session"
                    type="text"
                    name="session"
                    value=(account.academic_year)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record" }
        }
    )
}

fn transactions_table(account: &Account) -> Markup {
    let table_row = |transaction: &Transaction| {
        let edit_url = endpoints::format_endpoint(
            &endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, account.id),
            transaction.id,
        );
        let delete_url = endpoints::format_endpoint(
            &endpoints::format_endpoint(endpoints::TRANSACTION_API, account.id),
            transaction.id,
        );

        let signed = transaction.signed_amount();
        let amount_style = if signed < 0.0 {
            "px-6 py-4 text-red-600 dark:text-red-400"
        } else {
            "px-6 py-4 text-green-600 dark:text-green-400"
        };

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE) { (transaction.kind) }
                td class=(amount_style) { (format_currency(signed)) }
                td class=(TABLE_CELL_STYLE) { (transaction.reason) }

                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(session) = &transaction.academic_year {
                        span class=(SESSION_BADGE_STYLE) { (session) }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &format!(
                                "Delete this {} of {}?",
                                transaction.kind,
                                format_currency(transaction.amount)
                            ),
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    html!(
        section class="dark:bg-gray-800 overflow-x-auto"
        {
            table class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Reason" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Session" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in account.transactions.iter().rev() {
                        (table_row(transaction))
                    }

                    @if account.transactions.is_empty() {
                        tr
                        {
                            td
                                colspan="6"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No transactions recorded yet."
                            }
                        }
                    }
                }
            }
        }
    )
}
