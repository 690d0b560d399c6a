//! Line-oriented dashboard: one command per line of standard input.

use std::{
    io::{BufRead, Write, stdin, stdout},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};

use crate::{
    cli::{dataset, segmentation::SegmentationArgs},
    core::{clustering::Clusterer, timestamp},
    dataset::{Dataset, validator::validate},
    error::InvalidInput,
    model::Disaggregator,
    prelude::*,
    render::{build_appliances_table, render_appliance},
    session::Session,
};

#[derive(Parser)]
#[command(name = "dashboard", no_binary_name = true, disable_version_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: DashboardCommand,
}

#[derive(Subcommand)]
enum DashboardCommand {
    /// List the appliances of the loaded dataset.
    List,

    /// Chart the appliance over the whole recording.
    Select { appliance: String },

    /// Narrow the chart down to the inclusive time range, in local time.
    Range {
        /// Start date, `YYYY-MM-DD`.
        start_date: String,

        /// Start time, `HH:MM:SS`.
        start_time: String,

        /// End date, `YYYY-MM-DD`.
        end_date: String,

        /// End time, `HH:MM:SS`.
        end_time: String,
    },

    /// Chart the whole recording again.
    Reset,

    /// Validate and load another dataset.
    Upload { path: PathBuf },

    /// Leave the dashboard.
    #[clap(alias = "exit")]
    Quit,
}

#[derive(Parser)]
pub struct DashboardArgs {
    /// Dataset to load on start.
    #[clap(long = "dataset", env = "NILM_DATASET")]
    path: Option<PathBuf>,

    #[clap(flatten)]
    segmentation: SegmentationArgs,
}

impl DashboardArgs {
    pub fn run(self) -> Result {
        let mut dashboard = Dashboard::new(self.segmentation.session(), stdout().lock());
        if let Some(path) = &self.path {
            dashboard.upload(&dataset::load(path)?)?;
        }
        dashboard.run(stdin().lock())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[must_use]
pub struct Dashboard<M, C, W> {
    session: Session<M, C>,
    output: W,
    selected: Option<String>,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl<M: Disaggregator, C: Clusterer, W: Write> Dashboard<M, C, W> {
    pub const fn new(session: Session<M, C>, output: W) -> Self {
        Self { session, output, selected: None, range: None }
    }

    /// Handle the lines until `quit` or the end of input.
    ///
    /// A failed command is reported and the loop goes on.
    pub fn run(&mut self, input: impl BufRead) -> Result {
        writeln!(self.output, "{}", CommandLine::command().render_help())?;
        for line in input.lines() {
            let line = line.context("failed to read the command")?;
            match self.handle(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(error) => self.report(&error)?,
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(line = line))]
    pub fn handle(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match CommandLine::try_parse_from(line.split_whitespace()) {
            Ok(command_line) => command_line.command,
            Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp) => {
                write!(self.output, "{}", error.render())?;
                return Ok(Flow::Continue);
            }
            Err(error) => {
                let message = error.render().to_string();
                let message = message.strip_prefix("error: ").unwrap_or(&message).trim_end();
                return Err(InvalidInput::Command(message.to_owned()).into());
            }
        };
        match command {
            DashboardCommand::List => self.list()?,
            DashboardCommand::Select { appliance } => self.select(&appliance)?,
            DashboardCommand::Range { start_date, start_time, end_date, end_time } => {
                let start = timestamp::parse_local(&format!("{start_date} {start_time}"))?;
                let end = timestamp::parse_local(&format!("{end_date} {end_time}"))?;
                self.set_range(start, end)?;
            }
            DashboardCommand::Reset => {
                self.range = None;
                self.render_selected()?;
            }
            DashboardCommand::Upload { path } => self.upload_from(&path)?,
            DashboardCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Load the dataset, dropping the selection made on the previous one.
    pub fn upload(&mut self, dataset: &Dataset) -> Result {
        self.session.upload(dataset)?;
        self.selected = None;
        self.range = None;
        self.list()
    }

    fn upload_from(&mut self, path: &Path) -> Result {
        let dataset = Dataset::read_from(path)?;
        let report = validate(&dataset);
        writeln!(self.output, "{report}")?;
        if report.is_passed() { self.upload(&dataset) } else { Ok(()) }
    }

    fn list(&mut self) -> Result {
        let loaded = self.session.loaded().ok_or(InvalidInput::NoDataset)?;
        writeln!(self.output, "dataset `{}` ({})", loaded.name, loaded.id)?;
        writeln!(self.output, "{}", build_appliances_table(&loaded.predictions))?;
        Ok(())
    }

    fn select(&mut self, appliance: &str) -> Result {
        let _ = self.session.appliance(appliance)?;
        self.selected = Some(appliance.to_owned());
        self.range = None;
        self.render_selected()
    }

    fn set_range(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result {
        let appliance = self.selected.as_deref().ok_or(InvalidInput::NoAppliance)?;
        let _ = self.session.appliance(appliance)?.slice(start, end)?;
        self.range = Some((start, end));
        self.render_selected()
    }

    fn render_selected(&mut self) -> Result {
        let appliance = self.selected.as_deref().ok_or(InvalidInput::NoAppliance)?;
        let view = self.session.appliance(appliance)?;
        let (power, states) = match self.range {
            Some((start, end)) => view.slice(start, end)?,
            None => (view.power.clone(), view.states.clone()),
        };
        writeln!(self.output, "{}", render_appliance(view.name, &power, &states))?;
        Ok(())
    }

    fn report(&mut self, error: &Error) -> Result {
        if let Some(invalid_input) = error.downcast_ref::<InvalidInput>() {
            writeln!(self.output, "invalid input: {invalid_input}")?;
        } else {
            warn!("command failed: {error:#}");
            writeln!(self.output, "error: {error:#}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        core::{clustering::tests::CountingClusterer, series::tests::at},
        dataset::tests::sample,
        model::tests::CountingModel,
    };

    type TestDashboard = Dashboard<CountingModel, CountingClusterer, Vec<u8>>;

    fn dashboard() -> (TestDashboard, CountingModel, CountingClusterer) {
        let model = CountingModel::default();
        let clusterer = CountingClusterer::default();
        let session = Session::builder()
            .model(model.clone())
            .clusterer(clusterer.clone())
            .window_size(2)
            .build();
        (Dashboard::new(session, Vec::new()), model, clusterer)
    }

    fn output(dashboard: &mut TestDashboard) -> Result<String> {
        Ok(String::from_utf8(std::mem::take(&mut dashboard.output))?)
    }

    fn format_local(second: i64) -> String {
        at(second).with_timezone(&chrono::Local).format(timestamp::FORMAT).to_string()
    }

    fn invalid_input(error: &Error) -> Option<&InvalidInput> {
        error.downcast_ref::<InvalidInput>()
    }

    #[test]
    fn test_upload_lists_appliances() -> Result {
        let (mut dashboard, _, _) = dashboard();
        dashboard.upload(&sample())?;
        let output = output(&mut dashboard)?;
        let header = format!("dataset `building_5.csv` ({})", sample().id());
        assert!(output.starts_with(&header), "{output}");
        assert!(output.contains("fridge"));
        assert!(output.contains("kettle"));
        Ok(())
    }

    #[test]
    fn test_select_renders_the_chart() -> Result {
        let (mut dashboard, _, clusterer) = dashboard();
        dashboard.upload(&sample())?;
        assert_eq!(dashboard.handle("select kettle")?, Flow::Continue);
        assert!(output(&mut dashboard)?.contains("kettle usage with ON/OFF states"));
        assert_eq!(clusterer.n_calls.get(), 1);
        Ok(())
    }

    #[test]
    fn test_range_only_reslices() -> Result {
        let (mut dashboard, model, clusterer) = dashboard();
        dashboard.upload(&sample())?;
        dashboard.handle("select kettle")?;
        dashboard.handle(&format!("range {} {}", format_local(1), format_local(2)))?;
        dashboard.handle("reset")?;
        dashboard.handle("select fridge")?;
        dashboard.handle("select kettle")?;
        assert_eq!(model.n_runs.get(), 1);
        assert_eq!(clusterer.n_calls.get(), 2);
        Ok(())
    }

    #[test]
    fn test_range_errors_keep_the_previous_range() -> Result {
        let (mut dashboard, _, _) = dashboard();
        dashboard.upload(&sample())?;
        dashboard.handle("select kettle")?;
        dashboard.handle(&format!("range {} {}", format_local(1), format_local(2)))?;

        let error = dashboard
            .handle(&format!("range {} {}", format_local(2), format_local(1)))
            .unwrap_err();
        assert!(matches!(invalid_input(&error), Some(InvalidInput::InvertedRange { .. })));

        let error = dashboard
            .handle(&format!("range {} {}", format_local(0), format_local(60)))
            .unwrap_err();
        assert!(matches!(invalid_input(&error), Some(InvalidInput::OutOfRange { .. })));

        let error = dashboard.handle("range 2024-02-30 00:00:00 2024-03-01 00:00:00").unwrap_err();
        assert!(matches!(invalid_input(&error), Some(InvalidInput::Timestamp(_))));

        assert_eq!(dashboard.range, Some((at(1), at(2))));
        Ok(())
    }

    #[test]
    fn test_command_line_errors() {
        let (mut dashboard, _, _) = dashboard();
        for line in ["range yesterday", "select", "dance", "upload"] {
            let error = dashboard.handle(line).unwrap_err();
            assert!(matches!(invalid_input(&error), Some(InvalidInput::Command(_))), "{line}");
        }
        let error = dashboard.handle("dance").unwrap_err();
        assert!(error.to_string().contains("dance"), "{error}");
    }

    #[test]
    fn test_help() -> Result {
        let (mut dashboard, _, _) = dashboard();
        assert_eq!(dashboard.handle("help")?, Flow::Continue);
        let output = output(&mut dashboard)?;
        for command in ["list", "select", "range", "reset", "upload", "quit"] {
            assert!(output.contains(command), "{command}: {output}");
        }
        Ok(())
    }

    #[test]
    fn test_quit() -> Result {
        let (mut dashboard, _, _) = dashboard();
        assert_eq!(dashboard.handle("  ")?, Flow::Continue);
        assert_eq!(dashboard.handle("quit")?, Flow::Quit);
        assert_eq!(dashboard.handle("exit")?, Flow::Quit);
        Ok(())
    }

    #[test]
    fn test_nothing_loaded() {
        let (mut dashboard, _, _) = dashboard();
        let error = dashboard.handle("list").unwrap_err();
        assert_eq!(invalid_input(&error), Some(&InvalidInput::NoDataset));
        let error = dashboard.handle("reset").unwrap_err();
        assert_eq!(invalid_input(&error), Some(&InvalidInput::NoAppliance));
    }

    #[test]
    fn test_upload_missing_file() {
        let (mut dashboard, model, _) = dashboard();
        let error = dashboard.handle("upload /nonexistent/building_5.csv").unwrap_err();
        assert!(invalid_input(&error).is_none());
        assert_eq!(model.n_runs.get(), 0);
    }

    #[test]
    fn test_run_keeps_going_after_errors() -> Result {
        let (mut dashboard, _, _) = dashboard();
        dashboard.upload(&sample())?;
        let _ = output(&mut dashboard)?;

        let input = Cursor::new("select toaster\n\nselect fridge\nquit\nselect kettle\n");
        dashboard.run(input)?;
        let output = output(&mut dashboard)?;
        assert!(output.contains("invalid input: unknown appliance `toaster`"));
        assert!(output.contains("fridge usage with ON/OFF states"));
        assert!(!output.contains("kettle usage"));
        Ok(())
    }
}
