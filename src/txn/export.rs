//! CSV export of a student's ledger.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    Error,
    ledger::{AccountId, AccountStore, engine::session_matches, sqlite::SqliteAccountStore},
    session::{AcademicSession, SessionFilter},
    txn::TxnState,
};

/// The query parameters accepted by the export endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    /// A session tag to restrict the exported rows, or "all".
    pub session: Option<String>,
}

/// A route handler that downloads an account's ledger as a CSV file.
///
/// The rows follow the same column layout the import endpoint accepts, so
/// an exported file can be re-imported elsewhere.
pub async fn export_ledger_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<TxnState>,
    Query(query): Query<ExportQuery>,
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

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["student_code", "date", "type", "amount", "reason", "academic_year"])
        .map_err(|error| Error::InvalidCsv(error.to_string()))?;

    for transaction in account
        .transactions
        .iter()
        .filter(|transaction| session_matches(&account, transaction, &filter))
    {
        let date = transaction.date.to_string();
        let amount = format!("{:.2}", transaction.amount);

        writer
            .write_record([
                account.code.as_str(),
                date.as_str(),
                transaction.kind.as_str(),
                amount.as_str(),
                transaction.reason.as_str(),
                transaction
                    .academic_year
                    .as_ref()
                    .map(AcademicSession::as_str)
                    .unwrap_or(""),
            ])
            .map_err(|error| Error::InvalidCsv(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::InvalidCsv(error.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.csv\"", account.code),
        ),
    ];

    Ok((headers, bytes).into_response())
}

#[cfg(test)]
mod export_ledger_endpoint_tests {
    use axum::{
        body::to_bytes,
        extract::{Path, Query, State},
    };
    use time::macros::date;

    use crate::{
        Error,
        ledger::{
            AccountStore, NewAccount, NewTransaction, RetentionPolicy, TransactionKind,
            engine::record_transaction, sqlite::SqliteAccountStore,
        },
        session::AcademicSession,
        test_utils::get_header,
        txn::test_utils::test_state,
    };

    use super::{ExportQuery, export_ledger_endpoint};

    #[tokio::test]
    async fn exports_transactions_as_csv() {
        let (state, _) = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let mut account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::default(),
            })
            .unwrap();

        record_transaction(
            &mut account,
            NewTransaction {
                kind: TransactionKind::Deposit,
                amount: 500.0,
                date: date!(2025 - 09 - 01),
                reason: "term fees".to_owned(),
                academic_year: Some(AcademicSession::new("2025-26").unwrap()),
            },
            &RetentionPolicy::default(),
        )
        .unwrap();
        record_transaction(
            &mut account,
            NewTransaction {
                kind: TransactionKind::Withdraw,
                amount: 200.0,
                date: date!(2025 - 10 - 01),
                reason: "trip".to_owned(),
                academic_year: None,
            },
            &RetentionPolicy::default(),
        )
        .unwrap();
        store.put(&mut account).unwrap();

        let response = export_ledger_endpoint(
            Path(account.id),
            State(state),
            Query(ExportQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(get_header(&response, "content-type"), "text/csv");
        assert!(get_header(&response, "content-disposition").contains("MR-5774.csv"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(body.to_vec()).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();

        assert_eq!(
            lines[0],
            "student_code,date,type,amount,reason,academic_year"
        );
        assert_eq!(lines[1], "MR-5774,2025-09-01,deposit,500.00,term fees,2025-26");
        assert_eq!(lines[2], "MR-5774,2025-10-01,withdraw,200.00,trip,");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn session_filter_limits_exported_rows() {
        let (state, _) = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let mut account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::default(),
            })
            .unwrap();

        record_transaction(
            &mut account,
            NewTransaction {
                kind: TransactionKind::Deposit,
                amount: 100.0,
                date: date!(2024 - 09 - 01),
                reason: "carried over".to_owned(),
                academic_year: Some(AcademicSession::new("2024-25").unwrap()),
            },
            &RetentionPolicy::default(),
        )
        .unwrap();
        record_transaction(
            &mut account,
            NewTransaction {
                kind: TransactionKind::Deposit,
                amount: 40.0,
                date: date!(2025 - 09 - 01),
                reason: "top up".to_owned(),
                academic_year: Some(AcademicSession::new("2025-26").unwrap()),
            },
            &RetentionPolicy::default(),
        )
        .unwrap();
        store.put(&mut account).unwrap();

        let query = ExportQuery {
            session: Some("2024-25".to_owned()),
        };
        let response = export_ledger_endpoint(Path(account.id), State(state), Query(query))
            .await
            .unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(body.to_vec()).unwrap();

        assert!(csv.contains("carried over"));
        assert!(!csv.contains("top up"));
    }

    #[tokio::test]
    async fn missing_account_returns_not_found() {
        let (state, _) = test_state();

        let result =
            export_ledger_endpoint(Path(999), State(state), Query(ExportQuery::default())).await;

        assert_eq!(result.err(), Some(Error::AccountNotFound));
    }
}
