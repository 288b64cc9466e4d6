//! Date parsing for transaction forms and CSV imports.
//!
//! Spreadsheets exported from different tools disagree on date formats, so
//! the parser accepts ISO dates, slash dates in a configured day/month
//! order, and raw Excel serial numbers.

use time::{Date, Duration, macros::date, macros::format_description};

use crate::Error;

/// Which way round day and month appear in slash dates like "05/03/2025".
///
/// The order is fixed by configuration rather than guessed per value, so
/// "05/03/2025" always means the same date within one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// Day before month, as in "31/01/2025".
    #[default]
    DayFirst,
    /// Month before day, as in "01/31/2025".
    MonthFirst,
}

/// The day Excel serial 0 falls on. With this epoch serial 2 maps to
/// 1900-01-01, and the shift absorbs Excel's fictional 1900-02-29 so
/// serials after February 1900 line up.
const EXCEL_EPOCH: Date = date!(1899 - 12 - 30);

/// Parses the date formats that show up in manually entered forms and
/// spreadsheet exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateParser {
    /// The day/month order used for slash dates.
    pub order: DateOrder,
}

impl DateParser {
    /// Create a parser with the given slash-date order.
    pub fn new(order: DateOrder) -> Self {
        Self { order }
    }

    /// Parse a date string.
    ///
    /// A string of digits only is treated as an Excel serial day number.
    /// Slash dates use the configured [DateOrder]. ISO dates like
    /// "2025-01-31" are always accepted.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if no format matches.
    pub fn parse(&self, raw: &str) -> Result<Date, Error> {
        let raw = raw.trim();

        if !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit()) {
            return self.parse_excel_serial(raw);
        }

        let slash_format = match self.order {
            DateOrder::DayFirst => {
                format_description!("[day padding:none]/[month padding:none]/[year]")
            }
            DateOrder::MonthFirst => {
                format_description!("[month padding:none]/[day padding:none]/[year]")
            }
        };

        if let Ok(date) = Date::parse(raw, slash_format) {
            return Ok(date);
        }

        Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| Error::InvalidDate(raw.to_owned()))
    }

    fn parse_excel_serial(&self, raw: &str) -> Result<Date, Error> {
        let serial: i64 = raw
            .parse()
            .map_err(|_| Error::InvalidDate(raw.to_owned()))?;

        // Serial numbers below 61 predate Excel's fake leap day and are
        // not produced by real exports.
        if !(61..=219_146).contains(&serial) {
            return Err(Error::InvalidDate(raw.to_owned()));
        }

        EXCEL_EPOCH
            .checked_add(Duration::days(serial))
            .ok_or_else(|| Error::InvalidDate(raw.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{DateOrder, DateParser};

    #[test]
    fn parses_iso_dates_regardless_of_order() {
        for order in [DateOrder::DayFirst, DateOrder::MonthFirst] {
            assert_eq!(
                DateParser::new(order).parse("2025-01-31"),
                Ok(date!(2025 - 01 - 31))
            );
        }
    }

    #[test]
    fn slash_dates_follow_the_configured_order() {
        assert_eq!(
            DateParser::new(DateOrder::DayFirst).parse("05/03/2025"),
            Ok(date!(2025 - 03 - 05))
        );
        assert_eq!(
            DateParser::new(DateOrder::MonthFirst).parse("05/03/2025"),
            Ok(date!(2025 - 05 - 03))
        );
    }

    #[test]
    fn slash_dates_accept_unpadded_components() {
        assert_eq!(
            DateParser::new(DateOrder::DayFirst).parse("5/3/2025"),
            Ok(date!(2025 - 03 - 05))
        );
    }

    #[test]
    fn day_first_rejects_month_first_only_dates() {
        // The 13th month does not exist, so this can only be month first.
        assert_eq!(
            DateParser::new(DateOrder::DayFirst).parse("01/13/2025"),
            Err(Error::InvalidDate("01/13/2025".to_owned()))
        );
    }

    #[test]
    fn digit_strings_parse_as_excel_serials() {
        // 2025-01-31 is serial 45688.
        assert_eq!(
            DateParser::default().parse("45688"),
            Ok(date!(2025 - 01 - 31))
        );
        assert_eq!(
            DateParser::default().parse("61"),
            Ok(date!(1900 - 03 - 01))
        );
    }

    #[test]
    fn out_of_range_serials_are_rejected() {
        for raw in ["0", "60", "999999999"] {
            assert_eq!(
                DateParser::default().parse(raw),
                Err(Error::InvalidDate(raw.to_owned())),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            DateParser::default().parse("tomorrow"),
            Err(Error::InvalidDate("tomorrow".to_owned()))
        );
    }
}
