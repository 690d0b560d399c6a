use clap::Parser;

use crate::{
    cli::dataset::DatasetArgs,
    model::{Disaggregator, Submetered},
    prelude::*,
    render::build_appliances_table,
};

#[derive(Parser)]
pub struct AppliancesArgs {
    #[clap(flatten)]
    dataset: DatasetArgs,
}

impl AppliancesArgs {
    pub fn run(self) -> Result {
        let predictions = Submetered.disaggregate(&self.dataset.load()?)?;
        println!("{}", build_appliances_table(&predictions));
        Ok(())
    }
}
