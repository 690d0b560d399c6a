mod appliances;
mod dashboard;
mod dataset;
mod segmentation;
mod show;
mod validate;

use clap::{Parser, Subcommand};

use crate::{
    cli::{
        appliances::AppliancesArgs,
        dashboard::DashboardArgs,
        show::ShowArgs,
        validate::ValidateArgs,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that a meter export can be loaded.
    #[clap(name = "validate")]
    Validate(ValidateArgs),

    /// List the appliances found in a meter export.
    #[clap(name = "appliances")]
    Appliances(AppliancesArgs),

    /// Chart one appliance with its ON/OFF states.
    #[clap(name = "show")]
    Show(Box<ShowArgs>),

    /// Interactive dashboard over standard input.
    #[clap(name = "dashboard")]
    Dashboard(Box<DashboardArgs>),
}

impl Command {
    pub fn run(self) -> Result {
        match self {
            Self::Validate(args) => args.run(),
            Self::Appliances(args) => args.run(),
            Self::Show(args) => args.run(),
            Self::Dashboard(args) => args.run(),
        }
    }
}
