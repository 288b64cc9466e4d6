//! Bulk import of transactions, e.g. from a spreadsheet the school office
//! keeps.
//!
//! Imports are best effort: each row is applied independently, and a bad
//! row is reported rather than aborting the rest of the file.

use std::str::FromStr;

use crate::{
    Error,
    ledger::{
        dates::DateParser,
        engine::{RetentionPolicy, record_transaction},
        store::AccountStore,
        transaction::{NewTransaction, TransactionKind},
    },
    session::AcademicSession,
};

/// One transaction to import, with fields still in their raw string form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// The 1-based row number in the source file, for error reporting.
    pub row_number: usize,
    /// The code of the student to credit or debit.
    pub student_code: String,
    /// The transaction type, e.g. "deposit" or "withdrawal".
    pub kind: String,
    /// The amount as written in the file.
    pub amount: String,
    /// The date as written in the file.
    pub date: String,
    /// A free-text note.
    pub reason: String,
    /// The school year to tag the transaction with, if any.
    pub academic_year: Option<AcademicSession>,
}

/// A row that could not be imported, and why.
#[derive(Debug, PartialEq)]
pub struct RowFailure {
    /// The 1-based row number in the source file.
    pub row_number: usize,
    /// The code of the student the row referred to.
    pub student_code: String,
    /// What went wrong with the row.
    pub error: Error,
}

/// The outcome of a bulk import.
#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    /// How many rows were recorded successfully.
    pub success_count: usize,
    /// The rows that were skipped.
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    /// How many rows were skipped.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Apply each row to its student's account, collecting per-row failures.
///
/// Rows never abort the import: an unknown student code, a bad amount, or
/// a failed write just becomes a [RowFailure]. A write that loses to a
/// concurrent update is retried once against a fresh copy of the account.
///
/// # Errors
/// Only infrastructure failures, e.g. a poisoned database lock, abort the
/// import as a whole.
pub fn bulk_import(
    store: &impl AccountStore,
    rows: Vec<ImportRow>,
    date_parser: &DateParser,
    retention: &RetentionPolicy,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for row in rows {
        match import_row(store, &row, date_parser, retention) {
            Ok(()) => summary.success_count += 1,
            Err(error) => summary.failures.push(RowFailure {
                row_number: row.row_number,
                student_code: row.student_code,
                error,
            }),
        }
    }

    summary
}

fn import_row(
    store: &impl AccountStore,
    row: &ImportRow,
    date_parser: &DateParser,
    retention: &RetentionPolicy,
) -> Result<(), Error> {
    let kind = TransactionKind::from_str(&row.kind)?;
    let amount = row
        .amount
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(row.amount.clone()))?;
    let date = date_parser.parse(&row.date)?;

    let new_transaction = NewTransaction {
        kind,
        amount,
        date,
        reason: row.reason.clone(),
        academic_year: row.academic_year.clone(),
    };

    let mut account = store.get_by_code(&row.student_code)?;
    record_transaction(&mut account, new_transaction.clone(), retention)?;

    match store.put(&mut account) {
        Err(Error::WriteConflict) => {
            let mut account = store.get_by_code(&row.student_code)?;
            record_transaction(&mut account, new_transaction, retention)?;
            store.put(&mut account)
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        ledger::{
            account::NewAccount,
            dates::DateParser,
            engine::RetentionPolicy,
            sqlite::{SqliteAccountStore, initialize},
            store::AccountStore,
        },
        session::AcademicSession,
    };

    use super::{ImportRow, bulk_import};

    fn new_store() -> SqliteAccountStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteAccountStore::new(Arc::new(Mutex::new(connection)))
    }

    fn create_student(store: &SqliteAccountStore, code: &str) {
        store
            .create(NewAccount {
                name: format!("Student {code}"),
                code: code.to_owned(),
                profile_image: None,
                academic_year: AcademicSession::default(),
            })
            .unwrap();
    }

    fn row(row_number: usize, code: &str, kind: &str, amount: &str, date: &str) -> ImportRow {
        ImportRow {
            row_number,
            student_code: code.to_owned(),
            kind: kind.to_owned(),
            amount: amount.to_owned(),
            date: date.to_owned(),
            reason: "term 1 import".to_owned(),
            academic_year: None,
        }
    }

    #[test]
    fn valid_rows_are_recorded_and_balances_updated() {
        let store = new_store();
        create_student(&store, "S-001");
        create_student(&store, "S-002");

        let summary = bulk_import(
            &store,
            vec![
                row(1, "S-001", "deposit", "500", "15/01/2025"),
                row(2, "S-001", "withdrawal", "200", "01/02/2025"),
                row(3, "S-002", "deposit", "42.5", "2025-02-03"),
            ],
            &DateParser::default(),
            &RetentionPolicy::default(),
        );

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count(), 0);
        assert_eq!(store.get_by_code("S-001").unwrap().balance, 300.0);
        assert_eq!(store.get_by_code("S-002").unwrap().balance, 42.5);
    }

    #[test]
    fn bad_rows_are_reported_without_aborting_the_rest() {
        let store = new_store();
        create_student(&store, "S-001");

        let summary = bulk_import(
            &store,
            vec![
                row(1, "S-001", "deposit", "100", "15/01/2025"),
                row(2, "S-999", "deposit", "50", "15/01/2025"),
                row(3, "S-001", "deposit", "-5", "15/01/2025"),
                row(4, "S-001", "transfer", "10", "15/01/2025"),
                row(5, "S-001", "deposit", "10", "someday"),
                row(6, "S-001", "deposit", "25", "16/01/2025"),
            ],
            &DateParser::default(),
            &RetentionPolicy::default(),
        );

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count(), 4);

        let expected = [
            (2, Error::AccountNotFound),
            (3, Error::InvalidAmount("-5".to_owned())),
            (4, Error::InvalidKind("transfer".to_owned())),
            (5, Error::InvalidDate("someday".to_owned())),
        ];
        for (failure, (row_number, error)) in summary.failures.iter().zip(&expected) {
            assert_eq!(failure.row_number, *row_number);
            assert_eq!(failure.error, *error);
        }

        assert_eq!(store.get_by_code("S-001").unwrap().balance, 125.0);
    }

    #[test]
    fn unparseable_amount_is_reported_with_the_raw_text() {
        let store = new_store();
        create_student(&store, "S-001");

        let summary = bulk_import(
            &store,
            vec![row(1, "S-001", "deposit", "ten dollars", "15/01/2025")],
            &DateParser::default(),
            &RetentionPolicy::default(),
        );

        assert_eq!(summary.success_count, 0);
        assert_eq!(
            summary.failures[0].error,
            Error::InvalidAmount("ten dollars".to_owned())
        );
    }

    #[test]
    fn imports_respect_the_retention_policy() {
        let store = new_store();
        create_student(&store, "S-001");

        let summary = bulk_import(
            &store,
            vec![
                row(1, "S-001", "deposit", "100", "15/01/2025"),
                row(2, "S-001", "deposit", "20", "16/01/2025"),
                row(3, "S-001", "deposit", "3", "17/01/2025"),
            ],
            &DateParser::default(),
            &RetentionPolicy {
                max_entries: Some(2),
            },
        );

        assert_eq!(summary.success_count, 3);

        let account = store.get_by_code("S-001").unwrap();
        assert_eq!(account.transactions.len(), 2);
        assert_eq!(account.balance, 23.0);
    }
}
