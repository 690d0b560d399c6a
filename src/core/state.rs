use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{
    core::series::{PowerSeries, StateSeries},
    quantity::Watts,
};

#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ApplianceState {
    #[default]
    Off = 0,
    On = 1,
}

impl ApplianceState {
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<ApplianceState> for u8 {
    fn from(state: ApplianceState) -> Self {
        state as Self
    }
}

impl Display for ApplianceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}

/// Maximal run of consecutive ON samples.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OnInterval {
    /// Inclusive.
    pub first: DateTime<Utc>,

    /// Inclusive.
    pub last: DateTime<Utc>,

    pub n_samples: usize,
    pub mean_power: Watts,
}

/// Collapse the states into ON runs, measuring the power drawn within each of them.
pub fn on_intervals(power: &PowerSeries, states: &StateSeries) -> Vec<OnInterval> {
    power
        .iter()
        .zip_eq(states)
        .chunk_by(|(_, (_, state))| *state)
        .into_iter()
        .filter(|(state, _)| state.is_on())
        .filter_map(|(_, run)| {
            let run = run.map(|((timestamp, power), _)| (*timestamp, *power)).collect_vec();
            let (first, _) = run.first()?;
            let (last, _) = run.last()?;
            let mean_power = Watts::mean(run.iter().map(|(_, power)| *power));
            Some(OnInterval { first: *first, last: *last, n_samples: run.len(), mean_power })
        })
        .collect()
}
