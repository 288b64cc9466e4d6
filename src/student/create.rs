//! The page and endpoint for creating a student account.
//!
//! When a student re-enrols under a new code, the admin can supply their
//! previous code and the new account copies the old account's name and
//! photo.

use axum::{
    Form,
    extract::State,
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
    ledger::{AccountStore, NewAccount, sqlite::SqliteAccountStore},
    navigation::NavBar,
    session::AcademicSession,
    student::StudentState,
};

/// Route handler for the new student page.
pub async fn get_new_student_page(State(state): State<StudentState>) -> Response {
    new_student_view(&state.default_session, "").into_response()
}

/// The form data for creating a student account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudentForm {
    /// The student's display name.
    pub name: String,
    /// The student's unique code.
    pub code: String,
    /// The session tag, blank for the configured default.
    #[serde(default)]
    pub academic_year: String,
    /// An optional URL to the student's photo.
    #[serde(default)]
    pub profile_image: String,
    /// An existing account's code to copy the name and photo from.
    #[serde(default)]
    pub old_code: String,
}

/// A route handler for creating a student account.
pub async fn create_student_endpoint(
    State(state): State<StudentState>,
    Form(form): Form<NewStudentForm>,
) -> Response {
    let academic_year = if form.academic_year.trim().is_empty() {
        state.default_session.clone()
    } else {
        match AcademicSession::new(form.academic_year.trim()) {
            Ok(session) => session,
            Err(error) => return error.into_alert_response(),
        }
    };

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut name = form.name.trim().to_owned();
    let mut profile_image = Some(form.profile_image.trim().to_owned())
        .filter(|profile_image| !profile_image.is_empty());

    let old_code = form.old_code.trim();
    if !old_code.is_empty() {
        match store.get_by_code(old_code) {
            Ok(old_account) => {
                if name.is_empty() {
                    name = old_account.name;
                }
                if profile_image.is_none() {
                    profile_image = old_account.profile_image;
                }
            }
            Err(Error::AccountNotFound) => {
                return Alert::ErrorSimple {
                    message: format!("No student has the code {old_code}."),
                }
                .into_response_with_status(StatusCode::BAD_REQUEST);
            }
            Err(error) => {
                tracing::error!("Failed to look up old code {old_code}: {error}");
                return error.into_alert_response();
            }
        }
    }

    if name.is_empty() {
        return new_student_view(&academic_year, "Error: Name cannot be empty").into_response();
    }

    let result = store.create(NewAccount {
        name,
        code: form.code.trim().to_owned(),
        profile_image,
        academic_year,
    });

    match result {
        Ok(account) => (
            HxRedirect(endpoints::format_endpoint(
                endpoints::STUDENT_LEDGER_VIEW,
                account.id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyStudentCode | Error::DuplicateStudentCode(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a student: {error}");
            error.into_alert_response()
        }
    }
}

fn new_student_view(default_session: &AcademicSession, error_message: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_STUDENT_VIEW).into_html();
    let form = new_student_form_view(default_session, error_message);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base("Add Student", &[], &content)
}

fn new_student_form_view(default_session: &AcademicSession, error_message: &str) -> Markup {
    let create_student_endpoint = endpoints::STUDENTS_API;

    html! {
        form
            hx-post=(create_student_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="e.g., Asha Rao"
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="code" class=(FORM_LABEL_STYLE) { "Student code" }

                input
                    id="code"
                    type="text"
                    name="code"
                    placeholder="e.g., MR-5774"
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
                    value=(default_session)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="profile_image" class=(FORM_LABEL_STYLE) { "Photo URL" }

                input
                    id="profile_image"
                    type="text"
                    name="profile_image"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="old_code" class=(FORM_LABEL_STYLE) { "Previous code" }

                input
                    id="old_code"
                    type="text"
                    name="old_code"
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                {
                    "Copies the name and photo from an existing account, for
                    students re-enrolling under a new code."
                }
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
                "Add Student"
            }
        }
    }
}
