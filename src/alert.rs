//! Alert fragments for displaying success and error messages to admins.
//!
//! Alerts are swapped into the fixed `#alert-container` element via htmx
//! out-of-band swaps, so endpoints can report an outcome without replacing
//! the page content.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A message to show in the floating alert container.
#[derive(Debug, Clone)]
pub enum Alert {
    /// A success message with extra details.
    Success { message: String, details: String },
    /// A success message with no details.
    SuccessSimple { message: String },
    /// An error message with extra details.
    Error { message: String, details: String },
    /// An error message with no details.
    ErrorSimple { message: String },
}

impl Alert {
    fn render(&self) -> Markup {
        let (message, details, container_style, text_style) = match self {
            Alert::Success { message, details } => (
                message.as_str(),
                details.as_str(),
                "bg-green-50 dark:bg-gray-800 border border-green-300 dark:border-green-800",
                "text-green-800 dark:text-green-400",
            ),
            Alert::SuccessSimple { message } => (
                message.as_str(),
                "",
                "bg-green-50 dark:bg-gray-800 border border-green-300 dark:border-green-800",
                "text-green-800 dark:text-green-400",
            ),
            Alert::Error { message, details } => (
                message.as_str(),
                details.as_str(),
                "bg-red-50 dark:bg-gray-800 border border-red-300 dark:border-red-800",
                "text-red-800 dark:text-red-400",
            ),
            Alert::ErrorSimple { message } => (
                message.as_str(),
                "",
                "bg-red-50 dark:bg-gray-800 border border-red-300 dark:border-red-800",
                "text-red-800 dark:text-red-400",
            ),
        };

        html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class={ "p-4 mb-4 rounded-lg shadow " (container_style) }
                {
                    div class="flex items-start justify-between gap-2"
                    {
                        div
                        {
                            p class={ "text-sm font-medium " (text_style) } { (message) }

                            @if !details.is_empty()
                            {
                                p class={ "mt-1 text-sm " (text_style) } { (details) }
                            }
                        }

                        button
                            type="button"
                            class={ "text-sm font-semibold " (text_style) }
                            onclick="this.closest('#alert-container').classList.add('hidden')"
                        {
                            "✕"
                        }
                    }
                }
            }
        }
    }

    /// Render the alert with a non-OK status code, for reporting errors to
    /// htmx requests targeting the alert container.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.render()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.render().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::test_utils::{assert_valid_html, parse_html_fragment};

    use super::Alert;

    #[tokio::test]
    async fn success_alert_renders_message() {
        let response = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert!(html.html().contains("Saved"));
    }

    #[tokio::test]
    async fn error_alert_carries_status_and_details() {
        let response = Alert::Error {
            message: "Could not save".to_owned(),
            details: "Try again later.".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = parse_html_fragment(response).await;
        assert!(html.html().contains("Could not save"));
        assert!(html.html().contains("Try again later."));
    }
}
