//! Pure ledger operations on an in-memory [Account].
//!
//! These functions mutate the account value only. Callers persist the
//! result with [crate::ledger::AccountStore::put], which is where
//! concurrent writes are detected.

use crate::{
    Error,
    ledger::{
        account::Account,
        transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
    },
    session::SessionFilter,
};

/// How many ledger entries to keep per account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionPolicy {
    /// The maximum number of entries to keep, oldest dropped first.
    /// `None` keeps everything.
    pub max_entries: Option<usize>,
}

/// Check that an amount is a positive, finite number and round it to the
/// nearest cent.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the amount is zero, negative, NaN,
/// or infinite, or rounds to zero.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    let rounded = (amount * 100.0).round() / 100.0;

    if rounded <= 0.0 {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    Ok(rounded)
}

/// Whether `filter` selects `transaction`.
///
/// A transaction without its own session tag counts towards the account's
/// enrolment session.
pub fn session_matches(
    account: &Account,
    transaction: &Transaction,
    filter: &SessionFilter,
) -> bool {
    match filter {
        SessionFilter::All => true,
        SessionFilter::Year(session) => {
            transaction
                .academic_year
                .as_ref()
                .unwrap_or(&account.academic_year)
                == session
        }
    }
}

/// Sum the signed amounts of the transactions selected by `filter`.
///
/// This walks the transaction list rather than reading the cached balance,
/// so it is also what [recompute_balance] uses to repair the cache.
pub fn compute_balance(account: &Account, filter: &SessionFilter) -> f64 {
    account
        .transactions
        .iter()
        .filter(|transaction| session_matches(account, transaction, filter))
        .map(Transaction::signed_amount)
        .sum()
}

/// Recompute the cached all-time balance from the transaction list.
///
/// Idempotent: the cached balance always equals the sum of signed amounts
/// afterwards, no matter what it held before.
pub fn recompute_balance(account: &mut Account) {
    account.balance = compute_balance(account, &SessionFilter::All);
}

/// Append a transaction to the account, update the cached balance, and
/// apply the retention policy.
///
/// Returns the id assigned to the new transaction. Ids come from the
/// account's persistent counter so they are never reused, even after
/// retention drops old entries.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the amount is not a positive, finite
/// number.
pub fn record_transaction(
    account: &mut Account,
    new_transaction: NewTransaction,
    retention: &RetentionPolicy,
) -> Result<TransactionId, Error> {
    let amount = validate_amount(new_transaction.amount)?;

    let id = account.next_transaction_id;
    account.next_transaction_id += 1;

    account.transactions.push(Transaction {
        id,
        kind: new_transaction.kind,
        amount,
        date: new_transaction.date,
        reason: new_transaction.reason,
        academic_year: new_transaction.academic_year,
    });
    account.balance += account.transactions[account.transactions.len() - 1].signed_amount();

    apply_retention(account, retention);

    Ok(id)
}

/// Replace fields of an existing transaction and recompute the cached
/// balance from the full list.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the given id,
/// or [Error::InvalidAmount] if the new amount is invalid.
pub fn update_transaction(
    account: &mut Account,
    id: TransactionId,
    patch: TransactionPatch,
) -> Result<(), Error> {
    let amount = patch.amount.map(validate_amount).transpose()?;

    let Some(transaction) = account
        .transactions
        .iter_mut()
        .find(|transaction| transaction.id == id)
    else {
        return Err(Error::TransactionNotFound);
    };

    if let Some(kind) = patch.kind {
        transaction.kind = kind;
    }
    if let Some(amount) = amount {
        transaction.amount = amount;
    }
    if let Some(date) = patch.date {
        transaction.date = date;
    }
    if let Some(reason) = patch.reason {
        transaction.reason = reason;
    }
    if let Some(academic_year) = patch.academic_year {
        transaction.academic_year = academic_year;
    }

    recompute_balance(account);

    Ok(())
}

/// Remove a transaction from the account and recompute the cached balance
/// from the remaining entries.
///
/// Returns the removed transaction. Remaining transactions keep their ids.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the given id.
pub fn delete_transaction(
    account: &mut Account,
    id: TransactionId,
) -> Result<Transaction, Error> {
    let Some(index) = account
        .transactions
        .iter()
        .position(|transaction| transaction.id == id)
    else {
        return Err(Error::TransactionNotFound);
    };

    let removed = account.transactions.remove(index);
    recompute_balance(account);

    Ok(removed)
}

/// Drop the oldest entries beyond the policy's maximum and recompute the
/// cached balance from what is left.
///
/// After truncation the cached balance reflects only the surviving
/// entries, so dropping a deposit lowers the balance.
fn apply_retention(account: &mut Account, retention: &RetentionPolicy) {
    let Some(max_entries) = retention.max_entries else {
        return;
    };

    if account.transactions.len() <= max_entries {
        return;
    }

    let excess = account.transactions.len() - max_entries;
    account.transactions.drain(..excess);
    recompute_balance(account);
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        ledger::{
            account::Account,
            transaction::{NewTransaction, TransactionKind, TransactionPatch},
        },
        session::{AcademicSession, SessionFilter},
    };

    use super::{
        RetentionPolicy, compute_balance, delete_transaction, record_transaction,
        recompute_balance, update_transaction, validate_amount,
    };

    fn new_account() -> Account {
        Account {
            id: 1,
            name: "Asha Rao".to_owned(),
            code: "S-041".to_owned(),
            profile_image: None,
            academic_year: AcademicSession::default(),
            balance: 0.0,
            version: 1,
            next_transaction_id: 1,
            transactions: Vec::new(),
        }
    }

    fn deposit(amount: f64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Deposit,
            amount,
            date: date!(2025 - 01 - 15),
            reason: "pocket money".to_owned(),
            academic_year: None,
        }
    }

    fn withdrawal(amount: f64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Withdraw,
            amount,
            date: date!(2025 - 02 - 01),
            reason: "trip".to_owned(),
            academic_year: None,
        }
    }

    #[test]
    fn validate_amount_rejects_non_positive_and_non_finite() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.001] {
            assert_eq!(
                validate_amount(amount),
                Err(Error::InvalidAmount(amount.to_string())),
                "{amount} should be rejected"
            );
        }
    }

    #[test]
    fn validate_amount_rounds_to_cents() {
        assert_eq!(validate_amount(10.999), Ok(11.0));
        assert_eq!(validate_amount(10.004), Ok(10.0));
        assert_eq!(validate_amount(0.01), Ok(0.01));
    }

    #[test]
    fn record_updates_balance_and_assigns_sequential_ids() {
        let mut account = new_account();

        let first = record_transaction(&mut account, deposit(500.0), &RetentionPolicy::default())
            .unwrap();
        let second =
            record_transaction(&mut account, withdrawal(200.0), &RetentionPolicy::default())
                .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(account.balance, 300.0);
        assert_eq!(account.transactions.len(), 2);
    }

    #[test]
    fn record_rejects_invalid_amount_without_changing_account() {
        let mut account = new_account();

        let result = record_transaction(&mut account, deposit(-5.0), &RetentionPolicy::default());

        assert_eq!(result, Err(Error::InvalidAmount("-5".to_owned())));
        assert_eq!(account.transactions.len(), 0);
        assert_eq!(account.balance, 0.0);
        assert_eq!(account.next_transaction_id, 1);
    }

    #[test]
    fn balance_equals_sum_of_signed_amounts() {
        let mut account = new_account();

        for amount in [120.0, 35.5, 9.99] {
            record_transaction(&mut account, deposit(amount), &RetentionPolicy::default())
                .unwrap();
        }
        record_transaction(&mut account, withdrawal(50.0), &RetentionPolicy::default()).unwrap();

        let expected: f64 = account
            .transactions
            .iter()
            .map(|transaction| transaction.signed_amount())
            .sum();
        assert_eq!(account.balance, expected);
    }

    #[test]
    fn compute_balance_filters_by_session() {
        let mut account = new_account();
        let this_year = AcademicSession::new("2024-25").unwrap();
        let last_year = AcademicSession::new("2023-24").unwrap();

        let mut tagged = deposit(100.0);
        tagged.academic_year = Some(this_year.clone());
        record_transaction(&mut account, tagged, &RetentionPolicy::default()).unwrap();

        let mut old = deposit(40.0);
        old.academic_year = Some(last_year.clone());
        record_transaction(&mut account, old, &RetentionPolicy::default()).unwrap();

        record_transaction(&mut account, deposit(7.0), &RetentionPolicy::default()).unwrap();

        assert_eq!(compute_balance(&account, &SessionFilter::All), 147.0);
        assert_eq!(
            compute_balance(&account, &SessionFilter::Year(this_year)),
            100.0
        );
        assert_eq!(
            compute_balance(&account, &SessionFilter::Year(last_year)),
            40.0
        );
        // The untagged deposit counts towards the account's own session.
        assert_eq!(
            compute_balance(&account, &SessionFilter::Year(AcademicSession::default())),
            7.0
        );
    }

    #[test]
    fn recompute_balance_repairs_a_corrupt_cache_and_is_idempotent() {
        let mut account = new_account();
        record_transaction(&mut account, deposit(80.0), &RetentionPolicy::default()).unwrap();

        account.balance = 9999.0;
        recompute_balance(&mut account);
        assert_eq!(account.balance, 80.0);

        recompute_balance(&mut account);
        assert_eq!(account.balance, 80.0);
    }

    #[test]
    fn update_replaces_old_effect_with_new() {
        let mut account = new_account();
        let id =
            record_transaction(&mut account, deposit(500.0), &RetentionPolicy::default()).unwrap();

        update_transaction(
            &mut account,
            id,
            TransactionPatch {
                kind: Some(TransactionKind::Withdraw),
                amount: Some(100.0),
                ..TransactionPatch::default()
            },
        )
        .unwrap();

        assert_eq!(account.balance, -100.0);
        assert_eq!(account.transactions[0].amount, 100.0);
        assert_eq!(account.transactions[0].kind, TransactionKind::Withdraw);
    }

    #[test]
    fn update_repairs_a_corrupt_cache() {
        let mut account = new_account();
        record_transaction(&mut account, withdrawal(50.0), &RetentionPolicy::default()).unwrap();
        let id =
            record_transaction(&mut account, deposit(100.0), &RetentionPolicy::default()).unwrap();

        account.balance = 9999.0;
        update_transaction(
            &mut account,
            id,
            TransactionPatch {
                amount: Some(80.0),
                ..TransactionPatch::default()
            },
        )
        .unwrap();

        assert_eq!(account.balance, 30.0);
    }

    #[test]
    fn update_rejects_invalid_amount_before_mutating() {
        let mut account = new_account();
        let id =
            record_transaction(&mut account, deposit(10.0), &RetentionPolicy::default()).unwrap();

        let result = update_transaction(
            &mut account,
            id,
            TransactionPatch {
                amount: Some(0.0),
                ..TransactionPatch::default()
            },
        );

        assert_eq!(result, Err(Error::InvalidAmount("0".to_owned())));
        assert_eq!(account.balance, 10.0);
    }

    #[test]
    fn update_unknown_id_returns_transaction_not_found() {
        let mut account = new_account();

        assert_eq!(
            update_transaction(&mut account, 42, TransactionPatch::default()),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn delete_restores_balance_and_keeps_remaining_ids() {
        let mut account = new_account();
        let first =
            record_transaction(&mut account, deposit(500.0), &RetentionPolicy::default()).unwrap();
        let second =
            record_transaction(&mut account, withdrawal(200.0), &RetentionPolicy::default())
                .unwrap();

        let removed = delete_transaction(&mut account, second).unwrap();

        assert_eq!(removed.amount, 200.0);
        assert_eq!(account.balance, 500.0);
        assert_eq!(account.transactions[0].id, first);

        assert_eq!(
            delete_transaction(&mut account, second),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn delete_repairs_a_corrupt_cache() {
        let mut account = new_account();
        record_transaction(&mut account, withdrawal(50.0), &RetentionPolicy::default()).unwrap();
        let id =
            record_transaction(&mut account, deposit(100.0), &RetentionPolicy::default()).unwrap();

        account.balance = 9999.0;
        delete_transaction(&mut account, id).unwrap();

        assert_eq!(account.balance, -50.0);
    }

    #[test]
    fn retention_drops_oldest_entries_and_recomputes_balance() {
        let mut account = new_account();
        let retention = RetentionPolicy {
            max_entries: Some(2),
        };

        record_transaction(&mut account, deposit(100.0), &retention).unwrap();
        record_transaction(&mut account, deposit(20.0), &retention).unwrap();
        record_transaction(&mut account, deposit(3.0), &retention).unwrap();

        // The 100.0 deposit fell off the front, so it no longer counts.
        assert_eq!(account.transactions.len(), 2);
        assert_eq!(account.balance, 23.0);
        assert_eq!(
            account
                .transactions
                .iter()
                .map(|transaction| transaction.id)
                .collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn ids_are_not_reused_after_retention() {
        let mut account = new_account();
        let retention = RetentionPolicy {
            max_entries: Some(1),
        };

        record_transaction(&mut account, deposit(1.0), &retention).unwrap();
        record_transaction(&mut account, deposit(2.0), &retention).unwrap();
        let third = record_transaction(&mut account, deposit(3.0), &retention).unwrap();

        assert_eq!(third, 3);
        assert_eq!(account.next_transaction_id, 4);
    }
}
