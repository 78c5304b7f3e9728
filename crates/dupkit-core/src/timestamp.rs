use crate::error::{Error, Result};
use std::fmt;
use time::macros::format_description;
use time::OffsetDateTime;

const FORMAT_HINT: &str = "expected YYYY-MM-DDTHH:MM";

// Fixed-width YYYY-MM-DDTHH:MM; ordering is string ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTime(String);

impl SnapshotTime {
    /// Day-of-month is only checked against 01..=31.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::invalid(format!("bad timestamp '{input}': {FORMAT_HINT}"));

        let (date, clock) = input.split_once('T').ok_or_else(invalid)?;
        let unsigned = date.strip_prefix('-').unwrap_or(date);
        let mut parts = unsigned.rsplitn(3, '-');
        let day = parts.next().ok_or_else(invalid)?;
        let month = parts.next().ok_or_else(invalid)?;
        let year = parts.next().ok_or_else(invalid)?;
        let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;

        if year.len() < 4 || !all_digits(year) {
            return Err(invalid());
        }
        if !two_digit_in(month, 1, 12)
            || !two_digit_in(day, 1, 31)
            || !two_digit_in(hour, 0, 23)
            || !two_digit_in(minute, 0, 59)
        {
            return Err(invalid());
        }
        Ok(Self(input.to_string()))
    }

    pub fn from_listing(date: &str, clock: &str) -> Result<Self> {
        Self::parse(&format!("{date}T{clock}"))
    }

    pub fn now() -> Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let formatted = now
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
            .map_err(|err| Error::invalid(format!("cannot format current time: {err}")))?;
        Ok(Self(formatted))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn two_digit_in(s: &str, min: u8, max: u8) -> bool {
    if s.len() != 2 || !all_digits(s) {
        return false;
    }
    s.parse::<u8>().map(|v| (min..=max).contains(&v)).unwrap_or(false)
}
