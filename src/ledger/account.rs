//! Student accounts: the aggregate that owns a list of ledger transactions
//! and a cached running balance.

use crate::{
    session::AcademicSession,
    ledger::transaction::{Transaction, TransactionId},
};

/// The database id of a student account.
pub type AccountId = i64;

/// A student account with its full transaction history.
///
/// The transaction list is ordered oldest first. `balance` caches the sum
/// of all signed transaction amounts so list pages do not need to walk
/// every ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The database id of the account.
    pub id: AccountId,
    /// The student's display name.
    pub name: String,
    /// The student's unique code, e.g. a roll number.
    pub code: String,
    /// An optional URL or path to the student's photo.
    pub profile_image: Option<String>,
    /// The school year the student is enrolled in.
    pub academic_year: AcademicSession,
    /// The cached all-time balance in dollars.
    pub balance: f64,
    /// Incremented on every successful write, used to detect concurrent
    /// modification.
    pub version: i64,
    /// The next transaction id to assign. Never decreases.
    pub next_transaction_id: TransactionId,
    /// The account's transactions, oldest first.
    pub transactions: Vec<Transaction>,
}

impl Account {
    /// Look up a transaction by id.
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|transaction| transaction.id == id)
    }
}

/// The data needed to create a student account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The student's display name.
    pub name: String,
    /// The student's unique code.
    pub code: String,
    /// An optional URL or path to the student's photo.
    pub profile_image: Option<String>,
    /// The school year the student is enrolled in.
    pub academic_year: AcademicSession,
}

/// Filters and pagination for listing student accounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountQuery {
    /// Case-insensitive substring match on name or code.
    pub search: Option<String>,
    /// Only accounts enrolled in this session.
    pub academic_year: Option<AcademicSession>,
    /// How many accounts to return. `None` returns all matches.
    pub limit: Option<u64>,
    /// How many matching accounts to skip.
    pub offset: u64,
}
