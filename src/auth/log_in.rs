//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, endpoints,
    auth::cookie::{invalidate_auth_cookie, set_auth_cookie},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base},
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect password.";

/// How long the auth cookie should last if the admin selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt hash of the admin password.
    pub admin_password_hash: String,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            admin_password_hash: state.admin_password_hash.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

fn log_in_form(error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="password" class=(FORM_LABEL_STYLE) { "Password" }

                input
                    type="password"
                    name="password"
                    id="password"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus;

                @if let Some(error_message) = error_message
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            div class="flex items-center gap-2"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    class="w-4 h-4 rounded border-gray-300 dark:border-gray-600";

                label for="remember_me" class=(FORM_LABEL_STYLE) { "Stay signed in for a week" }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Log in" }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Markup {
    let content = html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            a href="/" class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "Bursar"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        "Admin log in"
                    }

                    (log_in_form(None))
                }
            }
        }
    };

    base("Log In", &[], &content)
}

/// The raw data entered by the admin in the log-in form.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Password entered during log-in.
    pub password: String,
    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is redirected to the dashboard page.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(log_in_data): Form<LogInData>,
) -> Response {
    let is_password_valid =
        match bcrypt::verify(&log_in_data.password, &state.admin_password_hash) {
            Ok(is_password_valid) => is_password_valid,
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return (
                    StatusCode::OK,
                    log_in_form(Some("An internal error occurred. Please try again later.")),
                )
                    .into_response();
            }
        };

    if !is_password_valid {
        return (
            StatusCode::OK,
            log_in_form(Some(INVALID_CREDENTIALS_ERROR_MSG)),
        )
            .into_response();
    }

    let cookie_duration = if log_in_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    set_auth_cookie(jar.clone(), cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}
