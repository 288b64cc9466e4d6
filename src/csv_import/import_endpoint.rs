use axum::{
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    alert::Alert,
    csv_import::ImportState,
    ledger::{
        import::{ImportRow, ImportSummary, RowFailure, bulk_import},
        sqlite::SqliteAccountStore,
        store::AccountStore,
    },
    notify::publish_balance_changed,
    session::AcademicSession,
};

/// How many skipped rows to list in the outcome alert before truncating.
const MAX_REPORTED_FAILURES: usize = 5;

/// Route handler for importing transactions from uploaded CSV files.
///
/// Each file must have "student_code", "date", "type" and "amount" columns,
/// matched case-insensitively, and may also have "reason" and "academic_year"
/// columns. Rows are applied best effort: a bad row is skipped and reported
/// in the outcome alert rather than aborting the rest of the file.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let mut rows = Vec::new();
    let mut parse_failures = Vec::new();

    loop {
        let field = multipart.next_field().await.map_err(|error| {
            tracing::error!("could not read multipart form: {error}");
            Error::MultipartError(error.to_string()).into_alert_response()
        })?;

        let Some(field) = field else {
            break;
        };

        let csv_data = parse_multipart_field(field)
            .await
            .map_err(|error| match error {
                Error::NotCsv => Alert::ErrorSimple {
                    message: "File type must be CSV.".to_owned(),
                }
                .into_response_with_status(StatusCode::BAD_REQUEST),
                error => {
                    tracing::error!("could not parse multipart field: {error}");
                    error.into_alert_response()
                }
            })?;

        let parsed = parse_import_csv(&csv_data)
            .inspect_err(|error| tracing::debug!("could not parse CSV: {error}"))
            .map_err(|error| {
                Alert::Error {
                    message: "Could not parse CSV".to_owned(),
                    details: error.to_string(),
                }
                .into_response_with_status(StatusCode::BAD_REQUEST)
            })?;

        rows.extend(parsed.rows);
        parse_failures.extend(parsed.failures);
    }

    if rows.is_empty() && parse_failures.is_empty() {
        return Err(Alert::ErrorSimple {
            message: "The uploaded files contained no transactions.".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST));
    }

    // Count rows per student before the import consumes them, so events can
    // be published only for codes that had at least one row recorded.
    let mut row_counts: Vec<(String, usize)> = Vec::new();
    for code in rows
        .iter()
        .map(|row| &row.student_code)
        .chain(parse_failures.iter().map(|failure| &failure.student_code))
    {
        match row_counts.iter_mut().find(|(counted, _)| counted == code) {
            Some((_, count)) => *count += 1,
            None => row_counts.push((code.clone(), 1)),
        }
    }

    let store = SqliteAccountStore::new(state.db_connection.clone());

    let mut summary = bulk_import(&store, rows, &state.date_parser, &state.retention);
    summary.failures.extend(parse_failures);
    summary.failures.sort_by_key(|failure| failure.row_number);

    for (code, total) in row_counts {
        let failed = summary
            .failures
            .iter()
            .filter(|failure| failure.student_code == code)
            .count();

        if failed < total
            && let Ok(account) = store.get_by_code(&code)
        {
            publish_balance_changed(state.publisher.as_ref(), &account);
        }
    }

    Ok(import_outcome_response(&summary))
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCsv);
    }

    let file_name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };
    let data = match field.text().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

/// Where each recognised column sits in the CSV header row.
struct ImportColumns {
    student_code: usize,
    kind: usize,
    amount: usize,
    date: usize,
    reason: Option<usize>,
    academic_year: Option<usize>,
}

impl ImportColumns {
    /// Find the recognised columns in `headers`, matching names
    /// case-insensitively.
    ///
    /// # Errors
    /// Returns [Error::InvalidCsv] naming the first required column that is
    /// missing.
    fn detect(headers: &csv::StringRecord) -> Result<Self, Error> {
        let find = |names: &[&str]| {
            headers.iter().position(|header| {
                let header = header.trim().to_ascii_lowercase();
                names.contains(&header.as_str())
            })
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| Error::InvalidCsv(format!("missing the {:?} column", names[0])))
        };

        Ok(Self {
            student_code: require(&["student_code"])?,
            kind: require(&["type", "kind"])?,
            amount: require(&["amount"])?,
            date: require(&["date"])?,
            reason: find(&["reason"]),
            academic_year: find(&["academic_year"]),
        })
    }
}

/// The rows of one CSV file, split into importable rows and rows that
/// already failed during parsing.
struct ParsedCsv {
    rows: Vec<ImportRow>,
    failures: Vec<RowFailure>,
}

fn field_text(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().trim().to_owned()
}

/// Parse one CSV file into import rows.
///
/// Amounts, dates and transaction types are kept as raw strings so that
/// [bulk_import] can report them per row. Session tags are validated here
/// because [ImportRow] carries them parsed; an invalid tag becomes a
/// [RowFailure] rather than aborting the file.
///
/// # Errors
/// Returns [Error::InvalidCsv] if a required column is missing or the file
/// is not well-formed CSV.
fn parse_import_csv(data: &str) -> Result<ParsedCsv, Error> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCsv(error.to_string()))?
        .clone();
    let columns = ImportColumns::detect(&headers)?;

    let mut parsed = ParsedCsv {
        rows: Vec::new(),
        failures: Vec::new(),
    };

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|error| Error::InvalidCsv(error.to_string()))?;
        let row_number = index + 1;
        let student_code = field_text(&record, columns.student_code);

        let session_tag = columns
            .academic_year
            .map(|column| field_text(&record, column))
            .unwrap_or_default();
        let academic_year = if session_tag.is_empty() {
            None
        } else {
            match AcademicSession::new(&session_tag) {
                Ok(session) => Some(session),
                Err(error) => {
                    parsed.failures.push(RowFailure {
                        row_number,
                        student_code,
                        error,
                    });
                    continue;
                }
            }
        };

        parsed.rows.push(ImportRow {
            row_number,
            student_code,
            kind: field_text(&record, columns.kind),
            amount: field_text(&record, columns.amount),
            date: field_text(&record, columns.date),
            reason: columns
                .reason
                .map(|column| field_text(&record, column))
                .unwrap_or_default(),
            academic_year,
        });
    }

    Ok(parsed)
}

fn import_outcome_response(summary: &ImportSummary) -> Response {
    let imported = format!(
        "Imported {} transaction{}.",
        summary.success_count,
        if summary.success_count == 1 { "" } else { "s" }
    );

    if summary.failures.is_empty() {
        return Alert::Success {
            message: "Import completed successfully!".to_owned(),
            details: imported,
        }
        .into_response_with_status(StatusCode::CREATED);
    }

    let mut skipped: Vec<String> = summary
        .failures
        .iter()
        .take(MAX_REPORTED_FAILURES)
        .map(|failure| {
            format!(
                "Row {} ({}): {}.",
                failure.row_number, failure.student_code, failure.error
            )
        })
        .collect();

    if summary.failure_count() > MAX_REPORTED_FAILURES {
        skipped.push(format!(
            "...and {} more.",
            summary.failure_count() - MAX_REPORTED_FAILURES
        ));
    }

    let status_code = if summary.success_count > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };

    Alert::Error {
        message: format!(
            "Import skipped {} row{}",
            summary.failure_count(),
            if summary.failure_count() == 1 { "" } else { "s" }
        ),
        details: format!("{imported} {}", skipped.join(" ")),
    }
    .into_response_with_status(status_code)
}
