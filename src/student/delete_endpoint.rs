//! Student account deletion endpoint.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    ledger::{AccountId, AccountStore, sqlite::SqliteAccountStore},
    student::StudentState,
};

/// Handle student account deletion. Deleting the account discards its
/// transactions with it.
pub async fn delete_student_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<StudentState>,
) -> Response {
    let store = SqliteAccountStore::new(state.db_connection.clone());

    match store.delete(account_id) {
        Ok(()) => Alert::SuccessSimple {
            message: "Student account deleted".to_owned(),
        }
        .into_response(),
        Err(Error::AccountNotFound) => Error::AccountNotFound.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting account #{account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_student_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };

    use crate::{
        ledger::{AccountStore, NewAccount, sqlite::SqliteAccountStore},
        session::AcademicSession,
        student::create::tests::test_state,
        test_utils::get_header,
    };

    use super::delete_student_endpoint;

    #[tokio::test]
    async fn delete_removes_account() {
        let state = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::default(),
            })
            .unwrap();

        let response = delete_student_endpoint(Path(account.id), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.get(account.id).is_err());
    }

    #[tokio::test]
    async fn delete_missing_account_returns_error_html() {
        let state = test_state();

        let response = delete_student_endpoint(Path(999), State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );
    }
}
