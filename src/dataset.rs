pub mod validator;

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display, Formatter},
    fs,
    path::Path,
};

use chrono::{DateTime, Utc};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;

use crate::{
    core::series::{PowerSeries, Series},
    prelude::*,
    quantity::Watts,
};

/// Unix seconds, UTC.
pub const TIMESTAMP_COLUMN: &str = "UNIX";

/// Aggregate mains reading.
pub const MAINS_COLUMN: &str = "Active (W)";

/// Mains measurements of types other than active power.
pub const NON_ACTIVE_COLUMNS: [&str; 2] = ["Apparent (VA)", "Reactive (VAR)"];

/// Content identity of an uploaded file: equal bytes, equal identity.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct DatasetId([u8; 16]);

impl DatasetId {
    pub fn of(content: &[u8]) -> Self {
        Self(md5::compute(content).0)
    }
}

impl Display for DatasetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl Debug for DatasetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Uploaded energy meter export.
///
/// The content is a CSV file with a header row: the [`TIMESTAMP_COLUMN`], optionally the
/// [`MAINS_COLUMN`], and one power column per appliance, in watts.
#[must_use]
pub struct Dataset {
    id: DatasetId,
    name: String,
    content: Vec<u8>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self { id: DatasetId::of(&content), name: name.into(), content }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let content =
            fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let this = Self::new(name, content);
        info!(id = %this.id, len = this.content.len(), "read the dataset");
        Ok(this)
    }

    pub const fn id(&self) -> DatasetId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn reader(&self) -> Reader<&[u8]> {
        ReaderBuilder::new().trim(Trim::All).from_reader(self.content.as_slice())
    }

    /// Power series of every appliance column, sorted by timestamp.
    #[instrument(skip_all, fields(dataset = self.name))]
    pub fn appliance_channels(&self) -> Result<BTreeMap<String, PowerSeries>> {
        let mut reader = self.reader();
        let headers = reader.headers().context("failed to read the header")?.clone();
        let timestamp_index = headers
            .iter()
            .position(|header| header == TIMESTAMP_COLUMN)
            .with_context(|| format!("missing the `{TIMESTAMP_COLUMN}` column"))?;
        let appliances = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| is_appliance_column(header))
            .collect_vec();
        ensure!(!appliances.is_empty(), "no appliance columns found");

        let mut rows = Vec::new();
        for (line, record) in (2..).zip(reader.records()) {
            let record = record.with_context(|| format!("failed to read line {line}"))?;
            let timestamp = parse_timestamp(cell(&record, timestamp_index)?)
                .with_context(|| format!("line {line}"))?;
            let values = appliances
                .iter()
                .map(|(index, header)| {
                    parse_power(cell(&record, *index)?)
                        .with_context(|| format!("line {line}, column `{header}`"))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push((timestamp, values));
        }
        rows.sort_by_key(|(timestamp, _)| *timestamp);
        debug!(n_rows = rows.len(), n_appliances = appliances.len(), "parsed");

        appliances
            .iter()
            .enumerate()
            .map(|(column, (_, header))| {
                let points =
                    rows.iter().map(|(timestamp, values)| (*timestamp, values[column])).collect();
                let series =
                    Series::try_new(points).with_context(|| format!("invalid `{header}` channel"))?;
                Ok(((*header).to_owned(), series))
            })
            .collect()
    }
}

#[must_use]
pub fn is_appliance_column(header: &str) -> bool {
    header != TIMESTAMP_COLUMN && header != MAINS_COLUMN && !NON_ACTIVE_COLUMNS.contains(&header)
}

fn cell(record: &StringRecord, index: usize) -> Result<&str> {
    record.get(index).with_context(|| format!("missing field #{index}"))
}

pub(crate) fn parse_timestamp(cell: &str) -> Result<DateTime<Utc>> {
    let seconds: i64 =
        cell.parse().with_context(|| format!("`{cell}` is not an integer Unix timestamp"))?;
    DateTime::from_timestamp(seconds, 0).with_context(|| format!("`{seconds}` is out of range"))
}

pub(crate) fn parse_power(cell: &str) -> Result<Watts> {
    let value: f64 = cell.parse().with_context(|| format!("`{cell}` is not a number"))?;
    ensure!(value.is_finite(), "`{cell}` is not a finite number");
    ensure!(value >= 0.0, "power must be non-negative, got `{cell}`");
    Ok(Watts(value))
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    // language=csv
    pub const MIMOS_SAMPLE: &str = "\
UNIX,Active (W),fridge,kettle
1667865602,150.0,80.0,0.0
1667865600,2100.0,80.0,2000.0
1667865601,2120.0,85.0,2010.0
1667865603,90.0,75.0,0.0
";

    pub fn sample() -> Dataset {
        Dataset::new("building_5.csv", MIMOS_SAMPLE.as_bytes().to_vec())
    }

    #[test]
    fn test_identity_follows_content() {
        assert_eq!(sample().id(), sample().id());
        assert_ne!(sample().id(), Dataset::new("building_5.csv", b"UNIX,fridge\n".to_vec()).id());
    }

    #[test]
    fn test_identity_display() {
        let id = DatasetId::of(b"");
        assert_eq!(id.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_appliance_channels() -> Result {
        let channels = sample().appliance_channels()?;
        assert_eq!(channels.keys().collect_vec(), vec!["fridge", "kettle"]);

        let kettle = &channels["kettle"];
        assert_eq!(kettle.len(), 4);
        let timestamps = kettle.timestamps().map(|timestamp| timestamp.timestamp()).collect_vec();
        assert_eq!(timestamps, vec![1_667_865_600, 1_667_865_601, 1_667_865_602, 1_667_865_603]);
        assert_abs_diff_eq!(kettle.values().next().unwrap().0, 2000.0);
        Ok(())
    }

    #[test]
    fn test_duplicate_timestamps() {
        let dataset = Dataset::new("x.csv", b"UNIX,fridge\n1,1.0\n1,2.0\n".to_vec());
        assert!(dataset.appliance_channels().is_err());
    }

    #[test]
    fn test_missing_timestamp_column() {
        let dataset = Dataset::new("x.csv", b"time,fridge\n1,1.0\n".to_vec());
        assert!(dataset.appliance_channels().is_err());
    }

    #[test]
    fn test_parse_power() {
        assert!(parse_power("12.5").is_ok());
        assert!(parse_power("-1").is_err());
        assert!(parse_power("NaN").is_err());
        assert!(parse_power("inf").is_err());
        assert!(parse_power("on").is_err());
    }
}
