//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    csv_import::{get_import_page, import_transactions_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    html::error_view,
    not_found::get_404_not_found,
    student::{
        create_student_endpoint, delete_student_endpoint, get_edit_student_page,
        get_new_student_page, get_student_ledger_page, get_students_page, update_student_endpoint,
    },
    txn::{
        create_transaction_endpoint, delete_transaction_endpoint, export_ledger_endpoint,
        get_edit_transaction_page, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::STUDENTS_VIEW, get(get_students_page))
        .route(endpoints::NEW_STUDENT_VIEW, get(get_new_student_page))
        .route(endpoints::STUDENT_LEDGER_VIEW, get(get_student_ledger_page))
        .route(endpoints::EDIT_STUDENT_VIEW, get(get_edit_student_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        // The export is a plain download link, so a failed auth check can
        // use a regular redirect.
        .route(endpoints::EXPORT_API, get(export_ledger_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::STUDENTS_API, post(create_student_endpoint))
            .route(
                endpoints::STUDENT_API,
                put(update_student_endpoint).delete(delete_student_endpoint),
            )
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION_API,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::IMPORT_API, post(import_transactions_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

async fn get_internal_server_error_page() -> Response {
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
