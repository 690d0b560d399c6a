use chrono::{DateTime, Local, NaiveDateTime, Utc};

use crate::error::InvalidInput;

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a user-entered `YYYY-MM-DD HH:MM:SS` timestamp, rejecting impossible dates and times.
pub fn parse(text: &str) -> Result<NaiveDateTime, InvalidInput> {
    let text = text.trim();
    // Chrono tolerates single-digit fields, the form field does not:
    if text.len() != "YYYY-MM-DD HH:MM:SS".len() {
        return Err(InvalidInput::Timestamp(text.to_owned()));
    }
    NaiveDateTime::parse_from_str(text, FORMAT)
        .map_err(|_| InvalidInput::Timestamp(text.to_owned()))
}

/// Parse the timestamp in the local time zone.
pub fn parse_local(text: &str) -> Result<DateTime<Utc>, InvalidInput> {
    parse(text)?
        .and_local_timezone(Local)
        .earliest()
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok_or_else(|| InvalidInput::Timestamp(text.to_owned()))
}
