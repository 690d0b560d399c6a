use std::{
    collections::{HashMap, hash_map::Entry},
    ops::RangeInclusive,
};

use bon::bon;
use chrono::{DateTime, Utc};

use crate::{
    core::{
        clustering::Clusterer,
        segmenter::{DEFAULT_WINDOW_SIZE, Segmenter},
        series::{PowerSeries, StateSeries},
    },
    dataset::{Dataset, DatasetId},
    error::InvalidInput,
    model::{Disaggregator, Predictions},
    prelude::*,
};

/// ON/OFF series by `(dataset, appliance)`.
#[must_use]
#[derive(Default)]
pub struct StateCache(HashMap<(DatasetId, String), StateSeries>);

impl StateCache {
    pub fn get_or_try_insert_with(
        &mut self,
        dataset_id: DatasetId,
        appliance: &str,
        segment: impl FnOnce() -> Result<StateSeries>,
    ) -> Result<&StateSeries> {
        match self.0.entry((dataset_id, appliance.to_owned())) {
            Entry::Occupied(entry) => {
                debug!(appliance, "cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(segment()?)),
        }
    }

    /// Drop everything computed for other datasets.
    pub fn evict_all_but(&mut self, dataset_id: DatasetId) {
        let len_before = self.0.len();
        self.0.retain(|(id, _), _| *id == dataset_id);
        debug!(n_evicted = len_before - self.0.len(), "evicted");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[must_use]
pub struct LoadedDataset {
    pub id: DatasetId,
    pub name: String,
    pub predictions: Predictions,
}

/// One user's dashboard state.
///
/// The model runs once per distinct uploaded dataset, and an appliance is segmented once per loaded
/// dataset. Everything else only re-slices what has been computed already.
#[must_use]
pub struct Session<M, C> {
    model: M,
    segmenter: Segmenter<C>,
    window_size: usize,
    loaded: Option<LoadedDataset>,
    cache: StateCache,
}

#[bon]
impl<M: Disaggregator, C: Clusterer> Session<M, C> {
    #[builder]
    pub fn new(
        model: M,
        clusterer: C,
        #[builder(default = DEFAULT_WINDOW_SIZE)] window_size: usize,
    ) -> Self {
        Self {
            model,
            segmenter: Segmenter::new(clusterer),
            window_size,
            loaded: None,
            cache: StateCache::default(),
        }
    }
}

impl<M: Disaggregator, C: Clusterer> Session<M, C> {
    /// Run the model on the dataset, unless it is the one already loaded.
    #[instrument(skip_all, fields(dataset = dataset.name(), id = %dataset.id()))]
    pub fn upload(&mut self, dataset: &Dataset) -> Result {
        if self.loaded.as_ref().is_some_and(|loaded| loaded.id == dataset.id()) {
            info!("the dataset is already loaded");
            return Ok(());
        }
        info!("running the model…");
        let predictions = self.model.disaggregate(dataset).context("the model has failed")?;
        self.cache.evict_all_but(dataset.id());
        self.loaded = Some(LoadedDataset {
            id: dataset.id(),
            name: dataset.name().to_owned(),
            predictions,
        });
        Ok(())
    }

    pub const fn loaded(&self) -> Option<&LoadedDataset> {
        self.loaded.as_ref()
    }

    /// Power and ON/OFF states of the appliance, segmenting it on first access.
    #[instrument(skip_all, fields(appliance = appliance))]
    pub fn appliance(&mut self, appliance: &str) -> Result<ApplianceView<'_>> {
        let loaded = self.loaded.as_ref().ok_or(InvalidInput::NoDataset)?;
        let (name, power) = loaded
            .predictions
            .get_key_value(appliance)
            .ok_or_else(|| InvalidInput::UnknownAppliance(appliance.to_owned()))?;
        let segmenter = &self.segmenter;
        let window_size = self.window_size;
        let states = self.cache.get_or_try_insert_with(loaded.id, name, || {
            info!("segmenting…");
            segmenter.segment(power, window_size)
        })?;
        Ok(ApplianceView { name, power, states })
    }

    #[cfg(test)]
    pub const fn cache(&self) -> &StateCache {
        &self.cache
    }
}

#[must_use]
pub struct ApplianceView<'a> {
    pub name: &'a str,
    pub power: &'a PowerSeries,
    pub states: &'a StateSeries,
}

impl ApplianceView<'_> {
    #[must_use]
    pub fn span(&self) -> Option<RangeInclusive<DateTime<Utc>>> {
        self.power.span()
    }

    /// Both series projected onto `start..=end`.
    pub fn slice(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(PowerSeries, StateSeries), InvalidInput> {
        Ok((self.power.slice(start, end)?, self.states.slice(start, end)?))
    }
}
