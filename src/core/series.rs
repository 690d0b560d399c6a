use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{core::state::ApplianceState, error::InvalidInput, prelude::*, quantity::Watts};

pub type Point<V> = (DateTime<Utc>, V);

/// Predicted active power of a single appliance.
pub type PowerSeries = Series<Watts>;

/// Inferred ON/OFF state, index-aligned with the [`PowerSeries`] it was derived from.
pub type StateSeries = Series<ApplianceState>;

/// Time series with strictly increasing timestamps.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Series<V>(Vec<Point<V>>);

impl<V> Default for Series<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Series<V> {
    pub fn try_new(points: Vec<Point<V>>) -> Result<Self> {
        if let Some(((earlier, _), (later, _))) =
            points.iter().tuple_windows().find(|((lhs, _), (rhs, _))| lhs >= rhs)
        {
            bail!("timestamps must be strictly increasing, but {later} follows {earlier}");
        }
        Ok(Self(points))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point<V>> {
        self.0.iter()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.0.iter().map(|(timestamp, _)| *timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, value)| value)
    }

    /// Earliest and latest timestamps, both inclusive.
    #[must_use]
    pub fn span(&self) -> Option<RangeInclusive<DateTime<Utc>>> {
        Some(self.0.first()?.0..=self.0.last()?.0)
    }

    /// Pair the timestamps with the new values, keeping the alignment.
    pub fn with_values<W>(&self, values: impl IntoIterator<Item = W>) -> Series<W> {
        let points = self.timestamps().zip_eq(values).collect();
        Series(points)
    }
}

impl<V: Clone> Series<V> {
    /// Project the series onto `start..=end`.
    ///
    /// Both bounds must lie within the series span, and `start` must not be after `end`.
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidInput> {
        if start > end {
            return Err(InvalidInput::InvertedRange { start, end });
        }
        let span = self.span().ok_or(InvalidInput::EmptySeries)?;
        for bound in [start, end] {
            if !span.contains(&bound) {
                return Err(InvalidInput::OutOfRange {
                    bound,
                    min: *span.start(),
                    max: *span.end(),
                });
            }
        }
        let from = self.0.partition_point(|(timestamp, _)| *timestamp < start);
        let to = self.0.partition_point(|(timestamp, _)| *timestamp <= end);
        Ok(Self(self.0[from..to].to_vec()))
    }
}

impl<'a, V> IntoIterator for &'a Series<V> {
    type Item = &'a Point<V>;
    type IntoIter = std::slice::Iter<'a, Point<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
