//! The persistence seam for student accounts.

use crate::{
    Error,
    ledger::account::{Account, AccountId, AccountQuery, NewAccount},
    session::AcademicSession,
};

/// Loads and saves student accounts with their transactions.
///
/// Writes use optimistic concurrency: [AccountStore::put] only succeeds
/// when the account's version still matches the stored row, and returns
/// [Error::WriteConflict] otherwise.
pub trait AccountStore {
    /// Fetch an account and its transactions by id.
    ///
    /// # Errors
    /// Returns [Error::AccountNotFound] if no account has the given id.
    fn get(&self, id: AccountId) -> Result<Account, Error>;

    /// Fetch an account and its transactions by student code.
    ///
    /// # Errors
    /// Returns [Error::AccountNotFound] if no account has the given code.
    fn get_by_code(&self, code: &str) -> Result<Account, Error>;

    /// Create a new account with no transactions and a zero balance.
    ///
    /// # Errors
    /// Returns [Error::EmptyStudentCode] if the code is blank, or
    /// [Error::DuplicateStudentCode] if another account already uses it.
    fn create(&self, new_account: NewAccount) -> Result<Account, Error>;

    /// Save an account and its transactions, checking the version.
    ///
    /// On success the account's version is bumped, both in the database
    /// and on the passed value.
    ///
    /// # Errors
    /// Returns [Error::WriteConflict] if the stored version no longer
    /// matches, or [Error::AccountNotFound] if the account was deleted.
    fn put(&self, account: &mut Account) -> Result<(), Error>;

    /// Delete an account and all of its transactions.
    ///
    /// # Errors
    /// Returns [Error::AccountNotFound] if no account has the given id.
    fn delete(&self, id: AccountId) -> Result<(), Error>;

    /// List accounts matching the query, without their transaction lists.
    ///
    /// Returned accounts have empty transaction lists. Use
    /// [AccountStore::get] when the ledger itself is needed.
    fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, Error>;

    /// Count the accounts matching the query's filters, ignoring
    /// pagination.
    fn count(&self, query: &AccountQuery) -> Result<usize, Error>;

    /// The distinct academic sessions found on accounts, newest first.
    fn sessions(&self) -> Result<Vec<AcademicSession>, Error>;
}
