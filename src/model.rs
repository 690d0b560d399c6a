use std::collections::BTreeMap;

use crate::{core::series::PowerSeries, dataset::Dataset, prelude::*};

/// Predicted power series by appliance name.
pub type Predictions = BTreeMap<String, PowerSeries>;

/// Disaggregation model: from the meter readings to per-appliance power.
pub trait Disaggregator {
    fn disaggregate(&self, dataset: &Dataset) -> Result<Predictions>;
}

/// Appliances recorded by their own sub-meters, which need no inference.
///
/// Stands in for a trained model: it yields the appliance channels of the dataset as they are.
#[derive(Copy, Clone, Debug, Default)]
pub struct Submetered;

impl Disaggregator for Submetered {
    #[instrument(skip_all, fields(dataset = dataset.name()))]
    fn disaggregate(&self, dataset: &Dataset) -> Result<Predictions> {
        let predictions = dataset.appliance_channels()?;
        info!(n_appliances = predictions.len(), "disaggregated");
        Ok(predictions)
    }
}
