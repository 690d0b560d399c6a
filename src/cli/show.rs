use chrono::{DateTime, Utc};
use clap::Parser;

use crate::{
    cli::{dataset::DatasetArgs, segmentation::SegmentationArgs},
    core::timestamp,
    prelude::*,
    render::render_appliance,
};

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(flatten)]
    dataset: DatasetArgs,

    #[clap(flatten)]
    segmentation: SegmentationArgs,

    #[clap(long, env = "NILM_APPLIANCE")]
    appliance: String,

    /// Start of the time range, `YYYY-MM-DD HH:MM:SS` in local time. Defaults to the first reading.
    #[clap(long, value_parser = timestamp::parse_local)]
    start: Option<DateTime<Utc>>,

    /// End of the time range, inclusive. Defaults to the last reading.
    #[clap(long, value_parser = timestamp::parse_local)]
    end: Option<DateTime<Utc>>,
}

impl ShowArgs {
    pub fn run(self) -> Result {
        let dataset = self.dataset.load()?;
        let mut session = self.segmentation.session();
        session.upload(&dataset)?;
        let view = session.appliance(&self.appliance)?;
        let span = view.span().context("the appliance has no readings")?;
        let (power, states) = view
            .slice(self.start.unwrap_or(*span.start()), self.end.unwrap_or(*span.end()))?;
        println!("{}", render_appliance(view.name, &power, &states));
        Ok(())
    }
}
