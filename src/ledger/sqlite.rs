//! SQLite persistence for student accounts and their ledgers.
//!
//! Accounts are stored as a row plus child ledger rows, written back as a
//! whole on [AccountStore::put]. The account row carries a version number
//! that every write checks and bumps, so two admins saving the same
//! account at once cannot silently overwrite each other.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    ledger::{
        account::{Account, AccountId, AccountQuery, NewAccount},
        store::AccountStore,
        transaction::{Transaction, TransactionKind},
    },
    session::AcademicSession,
};

/// Create the application tables if they do not exist.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            profile_image TEXT,
            academic_year TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            next_transaction_id INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS ledger_entry (
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            transaction_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            reason TEXT NOT NULL,
            academic_year TEXT,
            position INTEGER NOT NULL,
            PRIMARY KEY (account_id, transaction_id)
        );",
    )?;

    Ok(())
}

/// An [AccountStore] backed by a shared SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteAccountStore {
    /// Wrap a shared connection. [initialize] must have been run on it.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn get_by_column(&self, column: &str, value: &dyn rusqlite::ToSql) -> Result<Account, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let mut account = connection
            .query_row(
                &format!(
                    "SELECT id, name, code, profile_image, academic_year, balance, version, \
                    next_transaction_id FROM account WHERE {column} = ?1"
                ),
                params![value],
                map_account_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
                error => error.into(),
            })??;

        account.transactions = connection
            .prepare(
                "SELECT transaction_id, kind, amount, date, reason, academic_year \
                FROM ledger_entry WHERE account_id = ?1 ORDER BY position ASC",
            )?
            .query_map(params![account.id], map_transaction_row)?
            .collect::<Result<Result<Vec<_>, _>, _>>()??;

        Ok(account)
    }
}

impl AccountStore for SqliteAccountStore {
    fn get(&self, id: AccountId) -> Result<Account, Error> {
        self.get_by_column("id", &id)
    }

    fn get_by_code(&self, code: &str) -> Result<Account, Error> {
        self.get_by_column("code", &code)
    }

    fn create(&self, new_account: NewAccount) -> Result<Account, Error> {
        if new_account.code.trim().is_empty() {
            return Err(Error::EmptyStudentCode);
        }

        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection
            .execute(
                "INSERT INTO account (name, code, profile_image, academic_year) \
                VALUES (?1, ?2, ?3, ?4)",
                params![
                    new_account.name,
                    new_account.code,
                    new_account.profile_image,
                    new_account.academic_year.as_str(),
                ],
            )
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateStudentCode(new_account.code.clone())
                }
                error => error.into(),
            })?;

        let id = connection.last_insert_rowid();

        Ok(Account {
            id,
            name: new_account.name,
            code: new_account.code,
            profile_image: new_account.profile_image,
            academic_year: new_account.academic_year,
            balance: 0.0,
            version: 1,
            next_transaction_id: 1,
            transactions: Vec::new(),
        })
    }

    fn put(&self, account: &mut Account) -> Result<(), Error> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        let db_transaction = connection.transaction().map_err(Error::from)?;

        let rows_changed = db_transaction.execute(
            "UPDATE account SET name = ?1, code = ?2, profile_image = ?3, \
            academic_year = ?4, balance = ?5, version = version + 1, \
            next_transaction_id = ?6 WHERE id = ?7 AND version = ?8",
            params![
                account.name,
                account.code,
                account.profile_image,
                account.academic_year.as_str(),
                account.balance,
                account.next_transaction_id,
                account.id,
                account.version,
            ],
        )?;

        if rows_changed == 0 {
            let exists = db_transaction
                .query_row(
                    "SELECT 1 FROM account WHERE id = ?1",
                    params![account.id],
                    |_| Ok(()),
                )
                .is_ok();

            return if exists {
                Err(Error::WriteConflict)
            } else {
                Err(Error::AccountNotFound)
            };
        }

        db_transaction.execute(
            "DELETE FROM ledger_entry WHERE account_id = ?1",
            params![account.id],
        )?;

        for (position, transaction) in account.transactions.iter().enumerate() {
            db_transaction.execute(
                "INSERT INTO ledger_entry \
                (account_id, transaction_id, kind, amount, date, reason, academic_year, position) \
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    account.id,
                    transaction.id,
                    transaction.kind.as_str(),
                    transaction.amount,
                    transaction.date,
                    transaction.reason,
                    transaction
                        .academic_year
                        .as_ref()
                        .map(AcademicSession::as_str),
                    position as i64,
                ],
            )?;
        }

        db_transaction.commit()?;
        account.version += 1;

        Ok(())
    }

    fn delete(&self, id: AccountId) -> Result<(), Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection.execute(
            "DELETE FROM ledger_entry WHERE account_id = ?1",
            params![id],
        )?;
        let rows_changed = connection.execute("DELETE FROM account WHERE id = ?1", params![id])?;

        if rows_changed == 0 {
            Err(Error::AccountNotFound)
        } else {
            Ok(())
        }
    }

    fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, Error> {
        let (where_clause, mut parameters) = build_filters(query);

        let mut sql = format!(
            "SELECT id, name, code, profile_image, academic_year, balance, version, \
            next_transaction_id FROM account{where_clause} ORDER BY name ASC, id ASC"
        );

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ? OFFSET ?");
            parameters.push(Value::from(limit as i64));
            parameters.push(Value::from(query.offset as i64));
        }

        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let accounts = connection
            .prepare(&sql)?
            .query_map(params_from_iter(parameters), map_account_row)?
            .collect::<Result<Result<Vec<_>, _>, _>>()??;

        Ok(accounts)
    }

    fn count(&self, query: &AccountQuery) -> Result<usize, Error> {
        let (where_clause, parameters) = build_filters(query);

        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(id) FROM account{where_clause}"),
            params_from_iter(parameters),
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn sessions(&self) -> Result<Vec<AcademicSession>, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let sessions = connection
            .prepare("SELECT DISTINCT academic_year FROM account ORDER BY academic_year DESC")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|tag| AcademicSession::new(&tag))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }
}

fn build_filters(query: &AccountQuery) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut parameters = Vec::new();

    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
    {
        conditions.push("(name LIKE ? OR code LIKE ?)");
        let pattern = format!("%{search}%");
        parameters.push(Value::from(pattern.clone()));
        parameters.push(Value::from(pattern));
    }

    if let Some(session) = &query.academic_year {
        conditions.push("academic_year = ?");
        parameters.push(Value::from(session.as_str().to_owned()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (where_clause, parameters)
}

fn map_account_row(row: &Row) -> Result<Result<Account, Error>, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let code = row.get(2)?;
    let profile_image = row.get(3)?;
    let academic_year: String = row.get(4)?;
    let balance = row.get(5)?;
    let version = row.get(6)?;
    let next_transaction_id = row.get(7)?;

    Ok(AcademicSession::new(&academic_year).map(|academic_year| Account {
        id,
        name,
        code,
        profile_image,
        academic_year,
        balance,
        version,
        next_transaction_id,
        transactions: Vec::new(),
    }))
}

fn map_transaction_row(row: &Row) -> Result<Result<Transaction, Error>, rusqlite::Error> {
    let id = row.get(0)?;
    let kind: String = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let reason = row.get(4)?;
    let academic_year: Option<String> = row.get(5)?;

    let parsed = kind.parse::<TransactionKind>().and_then(|kind| {
        let academic_year = academic_year
            .map(|tag| AcademicSession::new(&tag))
            .transpose()?;

        Ok(Transaction {
            id,
            kind,
            amount,
            date,
            reason,
            academic_year,
        })
    });

    Ok(parsed)
}
