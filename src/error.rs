use chrono::{DateTime, Utc};
use derive_more::{Display, Error};

/// Caller-side mistakes: the request cannot be served as asked, and retrying won't help.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[display("the power series is empty")]
    EmptySeries,

    #[display("window size must be at least 1, got {_0}")]
    WindowSize(#[error(not(source))] usize),

    #[display("start time {start} is after end time {end}")]
    InvertedRange { start: DateTime<Utc>, end: DateTime<Utc> },

    #[display("{bound} is outside of the series range {min}..={max}")]
    OutOfRange { bound: DateTime<Utc>, min: DateTime<Utc>, max: DateTime<Utc> },

    #[display("`{_0}` is not a valid `YYYY-MM-DD HH:MM:SS` timestamp")]
    Timestamp(#[error(not(source))] String),

    #[display("unknown appliance `{_0}`")]
    UnknownAppliance(#[error(not(source))] String),

    #[display("no dataset has been uploaded yet")]
    NoDataset,

    #[display("no appliance is selected")]
    NoAppliance,

    /// Dashboard command line that does not parse, with the usage hint.
    #[display("{_0}")]
    Command(#[error(not(source))] String),
}
