#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod core;
mod dataset;
mod error;
mod model;
mod prelude;
mod quantity;
mod render;
mod session;

use std::io::stderr;

use clap::{Parser, crate_version};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::{cli::Args, prelude::*};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .with_writer(stderr)
        .without_time()
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");
    Args::parse().command.run()
}
