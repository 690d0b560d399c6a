use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    path::Path,
};

use crate::{
    dataset::{
        Dataset,
        NON_ACTIVE_COLUMNS,
        TIMESTAMP_COLUMN,
        is_appliance_column,
        parse_power,
        parse_timestamp,
    },
    prelude::*,
};

/// Outcome of inspecting an uploaded dataset.
#[must_use]
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Human-readable reasons, empty when the dataset has passed.
    pub failures: Vec<String>,

    /// Row failures beyond [`MAX_ROW_FAILURES`] are only counted.
    pub n_suppressed: usize,
}

/// Stop listing row-level failures after this many.
pub const MAX_ROW_FAILURES: usize = 10;

impl ValidationReport {
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
    }

    fn fail_row(&mut self, n_row_failures: &mut usize, reason: impl Into<String>) {
        *n_row_failures += 1;
        if *n_row_failures > MAX_ROW_FAILURES {
            self.n_suppressed += 1;
        } else {
            self.fail(reason);
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_passed() {
            return write!(f, "dataset validation passed");
        }
        write!(f, "dataset validation failed:")?;
        for failure in &self.failures {
            write!(f, "\n- {failure}")?;
        }
        if self.n_suppressed != 0 {
            write!(f, "\n- …and {} more row failures", self.n_suppressed)?;
        }
        Ok(())
    }
}

/// Check that the dataset is something the model can be run on.
///
/// Unlike reading the dataset, this does not stop at the first problem.
#[instrument(skip_all, fields(dataset = dataset.name()))]
pub fn validate(dataset: &Dataset) -> ValidationReport {
    let mut report = ValidationReport::default();

    let is_csv = Path::new(dataset.name())
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
    if !is_csv {
        report.fail(format!("`{}` must be a CSV file", dataset.name()));
    }

    let mut reader = dataset.reader();
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(error) => {
            report.fail(format!("failed to read the header: {error}"));
            return report;
        }
    };

    let timestamp_index = headers.iter().position(|header| header == TIMESTAMP_COLUMN);
    if timestamp_index.is_none() {
        report.fail(format!("missing the `{TIMESTAMP_COLUMN}` timestamp column"));
    }
    for header in headers.iter().filter(|header| NON_ACTIVE_COLUMNS.contains(header)) {
        report.fail(format!("power measurement type must be active-only, found `{header}`"));
    }
    if !headers.iter().any(is_appliance_column) {
        report.fail("no appliance columns found");
    }

    let mut seen_timestamps = HashSet::new();
    let mut n_row_failures = 0;
    let mut n_rows = 0_usize;
    for (line, record) in (2_usize..).zip(reader.records()) {
        n_rows += 1;
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                report.fail_row(&mut n_row_failures, format!("line {line}: {error}"));
                continue;
            }
        };
        if let Some(index) = timestamp_index {
            match parse_timestamp(record.get(index).unwrap_or_default()) {
                Ok(timestamp) if !seen_timestamps.insert(timestamp) => {
                    report.fail_row(
                        &mut n_row_failures,
                        format!("line {line}: duplicate timestamp {timestamp}"),
                    );
                }
                Ok(_) => {}
                Err(error) => {
                    report.fail_row(&mut n_row_failures, format!("line {line}: {error:#}"));
                }
            }
        }
        for (header, value) in headers.iter().zip(&record) {
            if header == TIMESTAMP_COLUMN {
                continue;
            }
            if let Err(error) = parse_power(value) {
                report.fail_row(
                    &mut n_row_failures,
                    format!("line {line}, column `{header}`: {error:#}"),
                );
            }
        }
    }
    if n_rows == 0 {
        report.fail("the dataset has no readings");
    }

    if report.is_passed() {
        info!(n_rows, "passed");
    } else {
        warn!(n_failures = report.failures.len() + report.n_suppressed, "failed");
    }
    report
}
