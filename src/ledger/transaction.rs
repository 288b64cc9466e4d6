//! Ledger transactions: deposits and withdrawals recorded against a
//! student account.

use std::{fmt::Display, str::FromStr};

use time::Date;

use crate::{Error, session::AcademicSession};

/// Identifies a transaction within its account.
///
/// Ids are assigned from a per-account counter and never reused, so a
/// transaction keeps its id even when earlier entries are deleted.
pub type TransactionId = i64;

/// Whether a transaction adds money to or removes money from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Money paid into the account.
    Deposit,
    /// Money taken out of the account.
    Withdraw,
}

impl TransactionKind {
    /// The signed effect of a transaction of this kind on a balance.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Deposit => amount,
            TransactionKind::Withdraw => -amount,
        }
    }

    /// The string stored in the database and shown in CSV exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" | "withdrawal" => Ok(TransactionKind::Withdraw),
            _ => Err(Error::InvalidKind(s.to_owned())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A deposit or withdrawal recorded against a student account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Identifies the transaction within its account.
    pub id: TransactionId,
    /// Whether the transaction is a deposit or a withdrawal.
    pub kind: TransactionKind,
    /// The amount of money in dollars, always positive.
    pub amount: f64,
    /// The date the money changed hands.
    pub date: Date,
    /// A free-text note, e.g. "trip money".
    pub reason: String,
    /// The school year the transaction belongs to, if tagged.
    pub academic_year: Option<AcademicSession>,
}

impl Transaction {
    /// The signed effect of this transaction on the account balance.
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

/// The data needed to record a new transaction, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether the transaction is a deposit or a withdrawal.
    pub kind: TransactionKind,
    /// The amount of money in dollars. Validated on record.
    pub amount: f64,
    /// The date the money changed hands.
    pub date: Date,
    /// A free-text note.
    pub reason: String,
    /// The school year the transaction belongs to, if tagged.
    pub academic_year: Option<AcademicSession>,
}

/// Fields to change on an existing transaction. `None` leaves the field
/// as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// Change the transaction type.
    pub kind: Option<TransactionKind>,
    /// Change the amount. Validated like a new transaction's amount.
    pub amount: Option<f64>,
    /// Change the date.
    pub date: Option<Date>,
    /// Change the note.
    pub reason: Option<String>,
    /// Change the session tag. The outer `None` leaves the tag alone, the
    /// inner option sets or clears it.
    pub academic_year: Option<Option<AcademicSession>>,
}
