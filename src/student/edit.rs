//! The page and endpoint for editing a student account's details.
//!
//! The edit form carries the account version it was rendered from, so a
//! save over someone else's concurrent change is rejected with a conflict
//! alert instead of silently overwriting it.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    endpoints,
    html::{FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base},
    ledger::{Account, AccountId, AccountStore, sqlite::SqliteAccountStore},
    navigation::NavBar,
    session::AcademicSession,
    student::StudentState,
};

/// Route handler for the edit student page.
pub async fn get_edit_student_page(
    Path(account_id): Path<AccountId>,
    State(state): State<StudentState>,
) -> Result<Response, Error> {
    let store = SqliteAccountStore::new(state.db_connection.clone());

    let account = store.get(account_id).inspect_err(|error| match error {
        Error::AccountNotFound => {}
        error => {
            tracing::error!(
                "An unexpected error occurred when fetching account #{account_id}: {error}"
            );
        }
    })?;

    Ok(edit_student_view(&account, "").into_response())
}

/// The form data for updating a student account's details.
#[derive(Debug, Clone, Deserialize)]
pub struct EditStudentForm {
    /// The student's display name.
    pub name: String,
    /// The student's unique code.
    pub code: String,
    /// The session tag the account is enrolled under.
    pub academic_year: String,
    /// An optional URL to the student's photo.
    #[serde(default)]
    pub profile_image: String,
    /// The account version the form was rendered from.
    pub version: i64,
}

/// A route handler for updating a student account's details.
pub async fn update_student_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<StudentState>,
    Form(form): Form<EditStudentForm>,
) -> Response {
    let academic_year = match AcademicSession::new(form.academic_year.trim()) {
        Ok(session) => session,
        Err(error) => return error.into_alert_response(),
    };

    if form.name.trim().is_empty() {
        return Alert::ErrorSimple {
            message: "Name cannot be empty".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    if form.code.trim().is_empty() {
        return Error::EmptyStudentCode.into_alert_response();
    }

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut account = match store.get(account_id) {
        Ok(account) => account,
        Err(error) => return error.into_alert_response(),
    };

    // The stored version moved on since the form was rendered, so this
    // save would clobber someone else's change.
    if account.version != form.version {
        return Error::WriteConflict.into_alert_response();
    }

    account.name = form.name.trim().to_owned();
    account.code = form.code.trim().to_owned();
    account.academic_year = academic_year;
    account.profile_image = Some(form.profile_image.trim().to_owned())
        .filter(|profile_image| !profile_image.is_empty());

    match store.put(&mut account) {
        Ok(()) => (
            HxRedirect(endpoints::STUDENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::WriteConflict) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating account #{account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_student_view(account: &Account, error_message: &str) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_STUDENT_VIEW, account.id);
    let update_endpoint = endpoints::format_endpoint(endpoints::STUDENT_API, account.id);

    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = edit_student_form_view(&update_endpoint, account, error_message);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base("Edit Student", &[], &content)
}

fn edit_student_form_view(
    update_endpoint: &str,
    account: &Account,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            input type="hidden" name="version" value=(account.version);

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(account.name)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="code" class=(FORM_LABEL_STYLE) { "Student code" }

                input
                    id="code"
                    type="text"
                    name="code"
                    value=(account.code)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="academic_year" class=(FORM_LABEL_STYLE) { "Academic session" }

                input
                    id="academic_year"
                    type="text"
                    name="academic_year"
                    value=(account.academic_year)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="profile_image" class=(FORM_LABEL_STYLE) { "Photo URL" }

                input
                    id="profile_image"
                    type="text"
                    name="profile_image"
                    value=(account.profile_image.as_deref().unwrap_or(""))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button
                type="submit"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                "Save Changes"
            }
        }
    }
}


#[cfg(test)]
mod update_student_endpoint_tests {
    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        endpoints,
        ledger::{AccountStore, NewAccount, sqlite::SqliteAccountStore},
        session::AcademicSession,
        student::create::tests::test_state,
        test_utils::assert_hx_redirect,
    };

    use super::{EditStudentForm, update_student_endpoint};

    fn edit_form(version: i64) -> EditStudentForm {
        EditStudentForm {
            name: "Asha Rao-Smith".to_owned(),
            code: "MR-5774".to_owned(),
            academic_year: "2025-26".to_owned(),
            profile_image: String::new(),
            version,
        }
    }

    #[tokio::test]
    async fn saves_changes_and_redirects() {
        let state = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::new("2024-25").unwrap(),
            })
            .unwrap();

        let response = update_student_endpoint(
            Path(account.id),
            State(state.clone()),
            Form(edit_form(account.version)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::STUDENTS_VIEW);

        let updated = store.get(account.id).unwrap();
        assert_eq!(updated.name, "Asha Rao-Smith");
        assert_eq!(updated.academic_year.as_str(), "2025-26");
        assert_eq!(updated.version, account.version + 1);
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_saving() {
        let state = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let mut account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::new("2024-25").unwrap(),
            })
            .unwrap();

        let stale_version = account.version;
        // A concurrent edit bumps the stored version.
        store.put(&mut account).unwrap();

        let response = update_student_endpoint(
            Path(account.id),
            State(state.clone()),
            Form(edit_form(stale_version)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let stored = store.get(account.id).unwrap();
        assert_eq!(stored.name, "Asha Rao");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let state = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::new("2024-25").unwrap(),
            })
            .unwrap();

        let mut form = edit_form(account.version);
        form.name = "  ".to_owned();
        let response = update_student_endpoint(Path(account.id), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
