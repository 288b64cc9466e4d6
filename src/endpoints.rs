//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/students/{account_id}', use [format_endpoint].
//! Endpoints with two parameters need [format_endpoint] applied once per parameter.

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in admins.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing student accounts.
pub const STUDENTS_VIEW: &str = "/students";
/// The page for creating a new student account.
pub const NEW_STUDENT_VIEW: &str = "/students/new";
/// The page showing a student's ledger.
pub const STUDENT_LEDGER_VIEW: &str = "/students/{account_id}";
/// The page for editing a student account's details.
pub const EDIT_STUDENT_VIEW: &str = "/students/{account_id}/edit";
/// The page for editing one of a student's transactions.
pub const EDIT_TRANSACTION_VIEW: &str = "/students/{account_id}/transactions/{transaction_id}/edit";
/// The page for importing transactions from CSV files.
pub const IMPORT_VIEW: &str = "/import";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in the admin.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create student accounts.
pub const STUDENTS_API: &str = "/api/students";
/// The route to update or delete a single student account.
pub const STUDENT_API: &str = "/api/students/{account_id}";
/// The route to record a transaction for a student.
pub const TRANSACTIONS_API: &str = "/api/students/{account_id}/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION_API: &str = "/api/students/{account_id}/transactions/{transaction_id}";
/// The route to upload CSV files for importing transactions.
pub const IMPORT_API: &str = "/api/import";
/// The route to download a student's ledger as a CSV file.
pub const EXPORT_API: &str = "/api/students/{account_id}/export";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/students/{account_id}', '{account_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Paths with two parameters, such as [TRANSACTION_API], need one call per
/// parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
