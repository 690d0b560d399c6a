use std::path::{Path, PathBuf};

use clap::Parser;

use crate::{
    dataset::{Dataset, validator::validate},
    prelude::*,
};

#[derive(Parser)]
pub struct DatasetArgs {
    /// Meter export: CSV with the `UNIX` timestamp column and one column per appliance.
    #[clap(long = "dataset", env = "NILM_DATASET")]
    pub path: PathBuf,
}

impl DatasetArgs {
    /// Read the dataset and refuse it unless it passes validation.
    pub fn load(&self) -> Result<Dataset> {
        load(&self.path)
    }
}

pub fn load(path: &Path) -> Result<Dataset> {
    let dataset = Dataset::read_from(path)?;
    let report = validate(&dataset);
    ensure!(report.is_passed(), "{report}");
    Ok(dataset)
}
