//! Defines functions for handling admin authentication with cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

pub(crate) const COOKIE_SESSION: &str = "session";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The value stored in the session cookie. There is only one admin account,
/// so the cookie carries no id.
pub(crate) const SESSION_COOKIE_VALUE: &str = "admin";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Add an auth cookie to the cookie jar, indicating that the admin is logged in.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns a [time::error::Format] if the expiry time cannot be formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, time::error::Format> {
    let expiry = OffsetDateTime::now_utc() + duration;
    // Use format instead of to_string to avoid errors at midnight when the hour is printed as
    // a single digit when [DATE_TIME_FORMAT] expects two digits.
    let expiry_string = expiry.format(DATE_TIME_FORMAT)?;

    Ok(jar
        .add(
            Cookie::build((COOKIE_SESSION, SESSION_COOKIE_VALUE))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
        .add(
            Cookie::build((COOKIE_EXPIRY, expiry_string))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the expiry of the auth cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] if the auth cookie or expiry cookie are not in the cookie jar.
/// - [Error::DateError] if extending the cookie by `duration` would overflow the date time.
/// - [Error::DateError] if the new expiry date time cannot be formatted.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;
    let current_expiry = extract_date_time(&expiry_cookie).map_err(|_| Error::DateError)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::DateError)?;

    let expiry = max(current_expiry, new_expiry);

    set_auth_cookie_expiry(jar, expiry)
}

/// Sets the expires field of the auth cookie and the expires field and
/// value of the expiry cookie in `jar` to `expiry`.
///
/// # Errors
///
/// If an error is returned, the cookie jar is not modified.
///
/// Returns a:
/// - [Error::CookieMissing] if the auth cookie or expiry cookie are not in the cookie jar.
/// - [Error::DateError] if the new expiry date time cannot be formatted.
pub(crate) fn set_auth_cookie_expiry(
    jar: PrivateCookieJar,
    expiry: OffsetDateTime,
) -> Result<PrivateCookieJar, Error> {
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|_| Error::DateError)?;

    let mut auth_cookie = jar.get(COOKIE_SESSION).ok_or(Error::CookieMissing)?;
    let mut expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;

    auth_cookie.set_expires(expiry);
    expiry_cookie.set_expires(expiry);
    expiry_cookie.set_value(expiry_string);

    Ok(jar.add(auth_cookie).add(expiry_cookie))
}

/// Check that the jar holds a valid, unexpired admin session.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if the session or expiry cookie is absent.
/// - [Error::InvalidCredentials] if the session cookie holds the wrong
///   value or the session has expired.
/// - [Error::DateError] if the expiry cookie cannot be parsed.
pub(crate) fn validate_session_cookies(jar: &PrivateCookieJar) -> Result<(), Error> {
    let session_cookie = jar.get(COOKIE_SESSION).ok_or(Error::CookieMissing)?;

    if session_cookie.value_trimmed() != SESSION_COOKIE_VALUE {
        return Err(Error::InvalidCredentials);
    }

    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;
    let expiry = extract_date_time(&expiry_cookie).map_err(|_| Error::DateError)?;

    if expiry < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    Ok(())
}

/// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
         sign:mandatory]:[offset_minute]:[offset_second]"
);

pub(crate) fn extract_date_time(cookie: &Cookie) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(cookie.value_trimmed(), DATE_TIME_FORMAT)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

    use crate::Error;

    use super::{
        COOKIE_EXPIRY, COOKIE_SESSION, DATE_TIME_FORMAT, DEFAULT_COOKIE_DURATION,
        extend_auth_cookie_duration_if_needed, extract_date_time, invalidate_auth_cookie,
        set_auth_cookie, set_auth_cookie_expiry, validate_session_cookies,
    };

    #[test]
    fn can_extract_date_time() {
        let want = OffsetDateTime::now_utc() + Duration::minutes(5);
        let date_time_string = want.format(DATE_TIME_FORMAT).unwrap();
        let cookie = Cookie::build((COOKIE_EXPIRY, date_time_string)).build();

        let got = extract_date_time(&cookie).unwrap();

        assert_eq!(got, want, "got date time {:?}, want {:?}", got, want);
    }

    #[test]
    fn can_extract_date_time_at_midnight() {
        let want = datetime!(2021-01-01 00:00:00).assume_offset(UtcOffset::UTC);
        // Use format instead of to_string to avoid errors at midnight when the hour is printed as
        // a single digit when [DATE_TIME_FORMAT] expects two digits.
        let date_time_string = want.format(DATE_TIME_FORMAT).unwrap();
        let cookie = Cookie::build((COOKIE_EXPIRY, date_time_string)).build();

        let got = extract_date_time(&cookie).unwrap();

        assert_eq!(got, want, "got date time {:?}, want {:?}", got, want);
    }

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    /// Test helper macro to assert that two date times are within one second
    /// of each other. Used instead of a function so that the file and line
    /// number of the caller is included in the error message instead of the
    /// helper.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(1),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn can_set_cookie() {
        let jar = get_jar();

        let jar = set_auth_cookie(jar, DEFAULT_COOKIE_DURATION).unwrap();
        let session_cookie = jar.get(COOKIE_SESSION).unwrap();
        let expiry_cookie = jar.get(COOKIE_EXPIRY).unwrap();

        let got_expiry = extract_date_time(&expiry_cookie).unwrap();

        assert_eq!(session_cookie.value(), "admin");
        assert_date_time_close!(got_expiry, OffsetDateTime::now_utc() + Duration::minutes(30));
    }

    #[test]
    fn validate_session_cookies_succeeds_for_fresh_session() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION).unwrap();

        assert_eq!(validate_session_cookies(&jar), Ok(()));
    }

    #[test]
    fn validate_session_cookies_rejects_empty_jar() {
        assert_eq!(
            validate_session_cookies(&get_jar()),
            Err(Error::CookieMissing)
        );
    }

    #[test]
    fn validate_session_cookies_rejects_tampered_session_value() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION).unwrap();
        let jar = jar.add(Cookie::build((COOKIE_SESSION, "someone_else")).build());

        assert_eq!(
            validate_session_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn validate_session_cookies_rejects_expired_session() {
        let jar = set_auth_cookie(get_jar(), Duration::minutes(-5)).unwrap();

        assert_eq!(
            validate_session_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn can_set_cookie_expires() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, DEFAULT_COOKIE_DURATION).unwrap();

        let want = OffsetDateTime::now_utc() + Duration::days(10);
        let updated_jar = set_auth_cookie_expiry(jar, want).unwrap();
        let session_cookie = updated_jar.get(COOKIE_SESSION).unwrap();
        let expiry_cookie = updated_jar.get(COOKIE_EXPIRY).unwrap();

        assert_eq!(session_cookie.expires_datetime().unwrap(), want);
        assert_eq!(expiry_cookie.expires_datetime().unwrap(), want);
        assert_eq!(extract_date_time(&expiry_cookie).unwrap(), want);
    }

    #[test]
    fn can_extend_cookie_duration() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, Duration::minutes(10)).unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(20)).unwrap();
        let got_session_cookie = jar.get(COOKIE_SESSION).unwrap();
        let got_expiry_cookie = jar.get(COOKIE_EXPIRY).unwrap();
        let expiry_cookie_value = extract_date_time(&got_expiry_cookie).unwrap();

        let want = OffsetDateTime::now_utc() + Duration::minutes(20);
        assert_date_time_close!(expiry_cookie_value, want);
        assert_date_time_close!(got_session_cookie.expires_datetime().unwrap(), want);
        assert_date_time_close!(got_expiry_cookie.expires_datetime().unwrap(), want);
    }

    #[test]
    fn cookie_duration_does_not_change() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION).unwrap();
        let stale_cookie = jar.get(COOKIE_SESSION).unwrap();
        let want = Some(stale_cookie.expires_datetime().unwrap());

        // The initial cookie is set to expire in 30 minutes, so extending it by 5 seconds should not change the expiry.
        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::seconds(5)).unwrap();

        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_eq!(cookie.expires_datetime(), want);
    }

    #[test]
    fn invalidate_auth_cookie_succeeds() {
        let jar = set_auth_cookie(get_jar(), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = invalidate_auth_cookie(jar);
        let cookie = jar.get(COOKIE_SESSION).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));

        assert_eq!(
            validate_session_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }
}
