//! Academic sessions tag transactions with the school year they belong to,
//! so that balances can be reported per year as well as all time.

use std::fmt::Display;

use crate::Error;

/// The session applied to transactions that do not specify one.
pub const DEFAULT_ACADEMIC_SESSION: &str = "2025-26";

/// A school year such as "2024-25".
///
/// The second part must be the first year plus one, modulo a century.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcademicSession(String);

impl AcademicSession {
    /// Parse and validate a session tag.
    ///
    /// # Errors
    /// Returns [Error::InvalidSession] if the tag is not two consecutive
    /// years in the form "YYYY-YY".
    pub fn new(tag: &str) -> Result<Self, Error> {
        let bytes = tag.as_bytes();

        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(Error::InvalidSession(tag.to_owned()));
        }

        let (first, second) = (&tag[..4], &tag[5..]);

        let Ok(first_year) = first.parse::<u32>() else {
            return Err(Error::InvalidSession(tag.to_owned()));
        };

        let Ok(second_year) = second.parse::<u32>() else {
            return Err(Error::InvalidSession(tag.to_owned()));
        };

        if (first_year + 1) % 100 != second_year {
            return Err(Error::InvalidSession(tag.to_owned()));
        }

        Ok(Self(tag.to_owned()))
    }

    /// The session tag as a string slice, e.g. "2024-25".
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AcademicSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for AcademicSession {
    fn default() -> Self {
        Self(DEFAULT_ACADEMIC_SESSION.to_owned())
    }
}

/// Which transactions to include when computing an account balance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionFilter {
    /// Include every transaction on the account.
    #[default]
    All,
    /// Include only transactions tagged with the given session.
    Year(AcademicSession),
}

impl SessionFilter {
    /// Parse the `session` query/form parameter: absent or "all" means no
    /// filter, anything else must be a valid session tag.
    pub fn parse(raw: Option<&str>) -> Result<Self, Error> {
        match raw {
            None | Some("") | Some("all") => Ok(SessionFilter::All),
            Some(tag) => Ok(SessionFilter::Year(AcademicSession::new(tag)?)),
        }
    }
}

#[cfg(test)]
mod academic_session_tests {
    use crate::Error;

    use super::{AcademicSession, DEFAULT_ACADEMIC_SESSION};

    #[test]
    fn new_accepts_consecutive_years() {
        for tag in ["2024-25", "1999-00", "2099-00"] {
            assert_eq!(
                AcademicSession::new(tag).map(|session| session.to_string()),
                Ok(tag.to_owned())
            );
        }
    }

    #[test]
    fn new_rejects_malformed_tags() {
        for tag in ["2024", "2024-2025", "2024/25", "24-25", "abcd-ef", ""] {
            assert_eq!(
                AcademicSession::new(tag),
                Err(Error::InvalidSession(tag.to_owned())),
                "{tag} should be rejected"
            );
        }
    }

    #[test]
    fn new_rejects_non_consecutive_years() {
        assert_eq!(
            AcademicSession::new("2024-26"),
            Err(Error::InvalidSession("2024-26".to_owned()))
        );
    }

    #[test]
    fn default_is_valid() {
        assert!(AcademicSession::new(DEFAULT_ACADEMIC_SESSION).is_ok());
    }
}
