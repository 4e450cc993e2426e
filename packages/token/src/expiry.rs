//! Expiration times and relative duration expressions.
//!
//! Expressions look like `"15m"`, `"1 hour"`, `"7d"`, `"1.5h"`, `"-30s"` or
//! `"2 weeks ago"`. A leading `-` or a trailing ` ago` makes the offset
//! negative; a leading `+` or trailing ` from now` is accepted and changes
//! nothing. A year is 365.25 days. Fractional results are rounded to whole
//! seconds.

use crate::error::ExpiryError;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

const MINUTE: f64 = 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// Lifetime used when the caller does not pick one.
pub const DEFAULT_EXPIRATION: &str = "15m";

#[allow(clippy::unwrap_used)]
static PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\+|-)? ?(\d+|\d*\.\d+) ?(seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)(?: (ago|from now))?$",
    )
    .unwrap()
});

/// When an issued token stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Relative to the issuance time
    In(Duration),
    /// Fixed point in time
    At(DateTime<Utc>),
}

impl Default for Expiration {
    fn default() -> Self {
        Expiration::In(Duration::minutes(15))
    }
}

impl Expiration {
    /// The `exp` value for a token issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryError::OutOfRange` if the sum overflows.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<i64, ExpiryError> {
        match self {
            Expiration::In(offset) => now
                .checked_add_signed(*offset)
                .map(|at| at.timestamp())
                .ok_or(ExpiryError::OutOfRange),
            Expiration::At(at) => Ok(at.timestamp()),
        }
    }
}

impl FromStr for Expiration {
    type Err = ExpiryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Expiration::In)
    }
}

impl From<Duration> for Expiration {
    fn from(offset: Duration) -> Self {
        Expiration::In(offset)
    }
}

impl From<DateTime<Utc>> for Expiration {
    fn from(at: DateTime<Utc>) -> Self {
        Expiration::At(at)
    }
}

/// Parse a relative duration expression.
///
/// # Errors
///
/// Returns `ExpiryError::Invalid` when the expression does not match the
/// grammar, or combines a sign with ` ago`/` from now`, and
/// `ExpiryError::OutOfRange` when the value does not fit.
pub fn parse_duration(expr: &str) -> Result<Duration, ExpiryError> {
    let invalid = || ExpiryError::Invalid(expr.to_string());

    let captures = PERIOD.captures(expr).ok_or_else(invalid)?;
    let sign = captures.get(1).map(|m| m.as_str());
    let suffix = captures.get(4).map(|m| m.as_str().to_ascii_lowercase());
    if sign.is_some() && suffix.is_some() {
        return Err(invalid());
    }

    let value: f64 = captures
        .get(2)
        .map(|m| m.as_str())
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;
    let unit = captures
        .get(3)
        .map(|m| m.as_str().to_ascii_lowercase())
        .ok_or_else(invalid)?;

    let scale = match unit.as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        _ => YEAR,
    };

    let seconds = (value * scale).round();
    if !seconds.is_finite() || seconds > i64::MAX as f64 {
        return Err(ExpiryError::OutOfRange);
    }
    #[allow(clippy::cast_possible_truncation)]
    let mut seconds = seconds as i64;
    if sign == Some("-") || suffix.as_deref() == Some("ago") {
        seconds = -seconds;
    }

    Duration::try_seconds(seconds).ok_or(ExpiryError::OutOfRange)
}
