//! The page listing student accounts with search, session filtering and
//! pagination.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error, endpoints,
    html::{
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        SESSION_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    ledger::{AccountQuery, AccountStore, sqlite::SqliteAccountStore},
    navigation::NavBar,
    pagination::{create_pagination_indicators, pagination_nav},
    session::{AcademicSession, SessionFilter},
    student::StudentState,
};

/// The query parameters accepted by the student list page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentsQuery {
    /// The page number to display, starting from one.
    pub page: Option<u64>,
    /// A substring to match against student names and codes.
    pub search: Option<String>,
    /// A session tag, or "all" for every session.
    pub session: Option<String>,
}

/// One row of the student table.
#[derive(Debug, Clone)]
struct StudentRow {
    name: String,
    code: String,
    academic_year: AcademicSession,
    balance: f64,
    ledger_url: String,
    edit_url: String,
    delete_url: String,
}

/// Route handler for the page listing student accounts.
pub async fn get_students_page(
    State(state): State<StudentState>,
    Query(query): Query<StudentsQuery>,
) -> Result<Response, Error> {
    let filter = SessionFilter::parse(query.session.as_deref())?;
    let session_filter = match &filter {
        SessionFilter::All => None,
        SessionFilter::Year(session) => Some(session.clone()),
    };
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
        .map(str::to_owned);

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let page_size = state.pagination_config.default_page_size;
    let curr_page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .max(1);

    let account_query = AccountQuery {
        search: search.clone(),
        academic_year: session_filter,
        limit: Some(page_size),
        offset: (curr_page - 1) * page_size,
    };

    let accounts = store
        .list(&account_query)
        .inspect_err(|error| tracing::error!("Failed to list student accounts: {error}"))?;
    let student_count = store
        .count(&account_query)
        .inspect_err(|error| tracing::error!("Failed to count student accounts: {error}"))?;
    let sessions = store
        .sessions()
        .inspect_err(|error| tracing::error!("Failed to list academic sessions: {error}"))?;

    let rows = accounts
        .iter()
        .map(|account| StudentRow {
            name: account.name.clone(),
            code: account.code.clone(),
            academic_year: account.academic_year.clone(),
            balance: account.balance,
            ledger_url: endpoints::format_endpoint(endpoints::STUDENT_LEDGER_VIEW, account.id),
            edit_url: endpoints::format_endpoint(endpoints::EDIT_STUDENT_VIEW, account.id),
            delete_url: endpoints::format_endpoint(endpoints::STUDENT_API, account.id),
        })
        .collect::<Vec<_>>();

    let page_count = (student_count as u64).div_ceil(page_size).max(1);
    let indicators = create_pagination_indicators(
        curr_page.min(page_count),
        page_count,
        state.pagination_config.max_pages,
    );

    let page_url = |page: u64| {
        let mut url = format!("{}?page={page}", endpoints::STUDENTS_VIEW);

        if let Some(search) = &search {
            url.push_str(&format!("&search={search}"));
        }
        if let Some(session) = query.session.as_deref().filter(|session| !session.is_empty()) {
            url.push_str(&format!("&session={session}"));
        }

        url
    };

    Ok(students_view(
        &rows,
        &sessions,
        search.as_deref().unwrap_or(""),
        &filter,
        &pagination_nav(&indicators, page_url),
    )
    .into_response())
}

fn students_view(
    rows: &[StudentRow],
    sessions: &[AcademicSession],
    search: &str,
    filter: &SessionFilter,
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();
    let new_student_route = endpoints::NEW_STUDENT_VIEW;

    let table_row = |row: &StudentRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(row.ledger_url) class=(LINK_STYLE) { (row.name) }
                }

                td class=(TABLE_CELL_STYLE) { (row.code) }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(SESSION_BADGE_STYLE) { (row.academic_year) }
                }

                td class=(TABLE_CELL_STYLE) { (format_currency(row.balance)) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &format!(
                                "Delete {} ({}) and their entire ledger?",
                                row.name, row.code
                            ),
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Students" }

                form
                    method="get"
                    action=(endpoints::STUDENTS_VIEW)
                    class="flex flex-wrap items-end gap-2"
                {
                    div class="grow"
                    {
                        input
                            type="search"
                            name="search"
                            value=(search)
                            placeholder="Search by name or code"
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        (session_filter_select(sessions, filter))
                    }

                    button
                        type="submit"
                        class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                            hover:dark:bg-blue-700 text-white text-sm rounded"
                    {
                        "Filter"
                    }
                }

                header class="flex justify-between flex-wrap items-end"
                {
                    a href=(new_student_route) class=(LINK_STYLE) { "Add Student" }
                }

                (students_cards_view(rows, new_student_route))

                section class="hidden lg:block dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Session" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No students found. "
                                        a href=(new_student_route) class=(LINK_STYLE)
                                        {
                                            "Add a student"
                                        }
                                        " to get started."
                                    }
                                }
                            }
                        }
                    }
                }

                div class="flex justify-center"
                {
                    (pagination)
                }
            }
        }
    );

    base("Students", &[], &content)
}

/// The dropdown for restricting the list to one academic session.
fn session_filter_select(sessions: &[AcademicSession], filter: &SessionFilter) -> Markup {
    html!(
        select name="session" class=(FORM_TEXT_INPUT_STYLE)
        {
            option value="all" selected[*filter == SessionFilter::All] { "All sessions" }

            @for session in sessions {
                option
                    value=(session)
                    selected[matches!(filter, SessionFilter::Year(selected) if selected == session)]
                {
                    (session)
                }
            }
        }
    )
}

fn students_cards_view(rows: &[StudentRow], new_student_route: &str) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for row in rows {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-student-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        div
                        {
                            a href=(row.ledger_url) class=(LINK_STYLE) { (row.name) }

                            p class="text-xs text-gray-500 dark:text-gray-400" { (row.code) }
                        }

                        span class=(SESSION_BADGE_STYLE) { (row.academic_year) }
                    }

                    p class="mt-2 text-sm font-medium" { (format_currency(row.balance)) }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &format!(
                                "Delete {} ({}) and their entire ledger?",
                                row.name, row.code
                            ),
                            "closest [data-student-card='true']",
                            "outerHTML",
                        ))
                    }
                }
            }

            @if rows.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    "No students found. "
                    a href=(new_student_route) class=(LINK_STYLE) { "Add a student" }
                    " to get started."
                }
            }
        }
    )
}
