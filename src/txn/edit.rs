//! The page and endpoint for editing a single ledger transaction.
//!
//! Like the student edit form, the transaction form carries the account
//! version it was rendered from so that concurrent edits surface as a
//! conflict instead of silently losing one of them.

use std::str::FromStr;

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
    Error, endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    ledger::{
        Account, AccountId, AccountStore, Transaction, TransactionId, TransactionKind,
        TransactionPatch, engine::update_transaction, sqlite::SqliteAccountStore,
    },
    navigation::NavBar,
    notify::publish_balance_changed,
    session::AcademicSession,
    txn::TxnState,
};

/// Route handler for the edit transaction page.
pub async fn get_edit_transaction_page(
    Path((account_id, transaction_id)): Path<(AccountId, TransactionId)>,
    State(state): State<TxnState>,
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

    let transaction = account
        .transaction(transaction_id)
        .ok_or(Error::TransactionNotFound)?;

    Ok(edit_transaction_view(&account, transaction).into_response())
}

/// The form data for updating a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct EditTransactionForm {
    /// "deposit" or "withdraw".
    pub kind: String,
    /// The amount of money in dollars.
    pub amount: f64,
    /// The date the money changed hands.
    pub date: String,
    /// A free-text note.
    #[serde(default)]
    pub reason: String,
    /// The session tag, blank to clear it.
    #[serde(default)]
    pub session: String,
    /// The account version the form was rendered from.
    pub version: i64,
}

/// A route handler for updating a transaction.
pub async fn update_transaction_endpoint(
    Path((account_id, transaction_id)): Path<(AccountId, TransactionId)>,
    State(state): State<TxnState>,
    Form(form): Form<EditTransactionForm>,
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

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut account = match store.get(account_id) {
        Ok(account) => account,
        Err(error) => return error.into_alert_response(),
    };

    if account.version != form.version {
        return Error::WriteConflict.into_alert_response();
    }

    let patch = TransactionPatch {
        kind: Some(kind),
        amount: Some(form.amount),
        date: Some(date),
        reason: Some(form.reason.trim().to_owned()),
        academic_year: Some(academic_year),
    };

    if let Err(error) = update_transaction(&mut account, transaction_id, patch) {
        return error.into_alert_response();
    }

    match store.put(&mut account) {
        Ok(()) => {
            publish_balance_changed(state.publisher.as_ref(), &account);

            (
                HxRedirect(endpoints::format_endpoint(
                    endpoints::STUDENT_LEDGER_VIEW,
                    account_id,
                )),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::WriteConflict) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating transaction #{transaction_id} for \
                account #{account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_transaction_view(account: &Account, transaction: &Transaction) -> Markup {
    let update_endpoint = endpoints::format_endpoint(
        &endpoints::format_endpoint(endpoints::TRANSACTION_API, account.id),
        transaction.id,
    );

    let nav_bar = NavBar::new(endpoints::STUDENTS_VIEW).into_html();
    let form = edit_transaction_form_view(&update_endpoint, account, transaction);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-lg font-semibold mb-4"
            {
                "Edit transaction for " (account.name)
            }

            (form)
        }
    };

    base("Edit Transaction", &[], &content)
}

fn edit_transaction_form_view(
    update_endpoint: &str,
    account: &Account,
    transaction: &Transaction,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            input type="hidden" name="version" value=(account.version);

            fieldset class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-2"
                {
                    input
                        id="kind-deposit"
                        type="radio"
                        name="kind"
                        value="deposit"
                        checked[transaction.kind == TransactionKind::Deposit]
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-deposit" class=(FORM_RADIO_LABEL_STYLE) { "Deposit" }
                }

                div class="flex items-center gap-2"
                {
                    input
                        id="kind-withdraw"
                        type="radio"
                        name="kind"
                        value="withdraw"
                        checked[transaction.kind == TransactionKind::Withdraw]
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-withdraw" class=(FORM_RADIO_LABEL_STYLE) { "Withdraw" }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    value=(transaction.amount)
                    min="0"
                    step="0.01"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(transaction.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="reason" class=(FORM_LABEL_STYLE) { "Reason" }

                input
                    id="reason"
                    type="text"
                    name="reason"
                    value=(transaction.reason)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="session" class=(FORM_LABEL_STYLE) { "Academic session" }

                input
                    id="session"
                    type="text"
                    name="session"
                    value=(transaction.academic_year.as_ref().map(AcademicSession::as_str).unwrap_or(""))
                    class=(FORM_TEXT_INPUT_STYLE);
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
mod edit_transaction_page_tests {
    use axum::extract::{Path, State};
    use time::macros::date;

    use crate::{
        Error,
        ledger::{
            AccountStore, NewAccount, NewTransaction, RetentionPolicy, TransactionKind,
            engine::record_transaction, sqlite::SqliteAccountStore,
        },
        session::AcademicSession,
        test_utils::{
            assert_form_input_with_value, assert_valid_html, must_get_form, parse_html_document,
        },
        txn::test_utils::test_state,
    };

    use super::get_edit_transaction_page;

    #[tokio::test]
    async fn page_shows_form_with_transaction_values() {
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
        let transaction_id = record_transaction(
            &mut account,
            NewTransaction {
                kind: TransactionKind::Deposit,
                amount: 75.5,
                date: date!(2025 - 09 - 01),
                reason: "term fees".to_owned(),
                academic_year: None,
            },
            &RetentionPolicy::default(),
        )
        .unwrap();
        store.put(&mut account).unwrap();

        let response = get_edit_transaction_page(Path((account.id, transaction_id)), State(state))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_form_input_with_value(&form, "amount", "number", "75.5");
        assert_form_input_with_value(&form, "date", "date", "2025-09-01");
        assert_form_input_with_value(&form, "reason", "text", "term fees");
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let (state, _) = test_state();
        let store = SqliteAccountStore::new(state.db_connection.clone());
        let account = store
            .create(NewAccount {
                name: "Asha Rao".to_owned(),
                code: "MR-5774".to_owned(),
                profile_image: None,
                academic_year: AcademicSession::default(),
            })
            .unwrap();

        let result = get_edit_transaction_page(Path((account.id, 42)), State(state)).await;

        assert_eq!(result.err(), Some(Error::TransactionNotFound));
    }
}
