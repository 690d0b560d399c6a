use std::path::PathBuf;

use clap::Parser;

use crate::{
    dataset::{Dataset, validator::validate},
    prelude::*,
};

#[derive(Parser)]
pub struct ValidateArgs {
    #[clap(long = "dataset", env = "NILM_DATASET")]
    path: PathBuf,
}

impl ValidateArgs {
    pub fn run(self) -> Result {
        let report = validate(&Dataset::read_from(&self.path)?);
        println!("{report}");
        ensure!(report.is_passed(), "`{}` cannot be loaded", self.path.display());
        Ok(())
    }
}
