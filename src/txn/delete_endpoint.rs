//! Transaction deletion endpoint.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    ledger::{
        AccountId, AccountStore, TransactionId, engine::delete_transaction,
        sqlite::SqliteAccountStore,
    },
    notify::publish_balance_changed,
    txn::TxnState,
};

/// Handle transaction deletion. Removing a transaction reverses its effect
/// on the account balance.
///
/// A conflicting concurrent write is retried once against a fresh copy of
/// the account before giving up.
pub async fn delete_transaction_endpoint(
    Path((account_id, transaction_id)): Path<(AccountId, TransactionId)>,
    State(state): State<TxnState>,
) -> Response {
    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut result = apply_delete(&store, account_id, transaction_id, &state);
    if result == Err(Error::WriteConflict) {
        result = apply_delete(&store, account_id, transaction_id, &state);
    }

    match result {
        Ok(()) => Alert::SuccessSimple {
            message: "Transaction deleted".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::AccountNotFound | Error::TransactionNotFound)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting transaction #{transaction_id} for \
                account #{account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn apply_delete(
    store: &SqliteAccountStore,
    account_id: AccountId,
    transaction_id: TransactionId,
    state: &TxnState,
) -> Result<(), Error> {
    let mut account = store.get(account_id)?;

    delete_transaction(&mut account, transaction_id)?;
    store.put(&mut account)?;

    publish_balance_changed(state.publisher.as_ref(), &account);

    Ok(())
}
