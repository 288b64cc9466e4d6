//! The endpoint for recording a deposit or withdrawal against a student
//! account.

use std::str::FromStr;

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error, endpoints,
    ledger::{
        AccountId, AccountStore, NewTransaction, TransactionKind, engine::record_transaction,
        sqlite::SqliteAccountStore,
    },
    notify::publish_balance_changed,
    session::AcademicSession,
    txn::TxnState,
};

/// The form data for recording a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// "deposit" or "withdraw".
    pub kind: String,
    /// The amount of money in dollars.
    pub amount: f64,
    /// The date the money changed hands.
    pub date: String,
    /// A free-text note.
    #[serde(default)]
    pub reason: String,
    /// The session tag, blank for the account's own session.
    #[serde(default)]
    pub session: String,
}

/// A route handler for recording a transaction against an account.
///
/// A conflicting concurrent write is retried once against a fresh copy of
/// the account before giving up.
pub async fn create_transaction_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<TxnState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let kind = match TransactionKind::from_str(&form.kind) {
        Ok(kind) => kind,
        Err(error) => return error.into_alert_response(),
    };

    let date = match state.date_parser.parse(&form.date) {
        Ok(date) => date,
        Err(error) => return error.into_alert_response(),
    };

    let academic_year = if form.session.trim().is_empty() {
        None
    } else {
        match AcademicSession::new(form.session.trim()) {
            Ok(session) => Some(session),
            Err(error) => return error.into_alert_response(),
        }
    };

    let new_transaction = NewTransaction {
        kind,
        amount: form.amount,
        date,
        reason: form.reason.trim().to_owned(),
        academic_year,
    };

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut result = apply_transaction(&store, account_id, &new_transaction, &state);
    if result == Err(Error::WriteConflict) {
        result = apply_transaction(&store, account_id, &new_transaction, &state);
    }

    match result {
        Ok(()) => (
            HxRedirect(endpoints::format_endpoint(
                endpoints::STUDENT_LEDGER_VIEW,
                account_id,
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::InvalidAmount(_) | Error::InsufficientBalance)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while recording a transaction for account \
                #{account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

/// Load a fresh copy of the account, apply the transaction, and save it.
///
/// A withdrawal that would leave the balance negative is rejected before
/// anything is changed.
fn apply_transaction(
    store: &SqliteAccountStore,
    account_id: AccountId,
    new_transaction: &NewTransaction,
    state: &TxnState,
) -> Result<(), Error> {
    let mut account = store.get(account_id)?;

    if new_transaction.kind == TransactionKind::Withdraw
        && account.balance - new_transaction.amount < 0.0
    {
        return Err(Error::InsufficientBalance);
    }

    record_transaction(&mut account, new_transaction.clone(), &state.retention)?;
    store.put(&mut account)?;

    publish_balance_changed(state.publisher.as_ref(), &account);

    Ok(())
}
