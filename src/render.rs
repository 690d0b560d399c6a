use std::ops::Range;

use average::Mean;
use chrono::{DateTime, Local, Utc};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{
        series::{PowerSeries, StateSeries},
        state::{ApplianceState, OnInterval, on_intervals},
        timestamp,
    },
    model::Predictions,
    quantity::Watts,
};

pub const CHART_WIDTH: usize = 72;

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Chart, summary, and ON intervals of one appliance.
#[must_use]
pub fn render_appliance(name: &str, power: &PowerSeries, states: &StateSeries) -> String {
    let intervals = on_intervals(power, states);
    format!(
        "{name} usage with ON/OFF states\npower  {}\nON/OFF {}\n{}\n{}",
        power_sparkline(power, CHART_WIDTH),
        state_strip(states, CHART_WIDTH),
        build_summary_table(name, power, states),
        build_intervals_table(&intervals),
    )
}

/// Split `0..len` into at most `width` contiguous, non-empty, nearly equal ranges.
fn buckets(len: usize, width: usize) -> impl Iterator<Item = Range<usize>> {
    let n_buckets = len.min(width);
    (0..n_buckets).map(move |bucket| (bucket * len / n_buckets)..((bucket + 1) * len / n_buckets))
}

#[must_use]
pub fn power_sparkline(power: &PowerSeries, width: usize) -> String {
    let values = power.values().map(|power| power.0).collect_vec();
    let max = values.iter().copied().fold(0.0, f64::max);
    buckets(values.len(), width)
        .map(|bucket| {
            if max <= 0.0 {
                return LEVELS[0];
            }
            let mean = values[bucket].iter().copied().collect::<Mean>().mean();
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                clippy::cast_sign_loss
            )]
            let level = ((mean / max) * (LEVELS.len() - 1) as f64).round() as usize;
            LEVELS[level.min(LEVELS.len() - 1)]
        })
        .collect()
}

/// `▁` for buckets that are entirely OFF, `█` for entirely ON, and `▄` for mixed ones.
#[must_use]
pub fn state_strip(states: &StateSeries, width: usize) -> String {
    let states = states.values().copied().collect_vec();
    buckets(states.len(), width)
        .map(|bucket| {
            let n_on = states[bucket.clone()].iter().filter(|state| state.is_on()).count();
            if n_on == 0 {
                '▁'
            } else if n_on == bucket.len() {
                '█'
            } else {
                '▄'
            }
        })
        .collect()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(timestamp::FORMAT).to_string()
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

#[must_use]
pub fn build_summary_table(name: &str, power: &PowerSeries, states: &StateSeries) -> Table {
    let on_share = {
        let estimate: Mean = states.values().map(|state| f64::from(u8::from(*state))).collect();
        if estimate.is_empty() { 0.0 } else { estimate.mean() }
    };
    let (from, to) = power.span().map_or_else(Default::default, |span| {
        (format_timestamp(*span.start()), format_timestamp(*span.end()))
    });

    let mut table = styled_table();
    table
        .set_header(vec![
            Cell::from("Appliance").add_attribute(Attribute::Bold),
            Cell::from("From"),
            Cell::from("To"),
            Cell::from("Samples").set_alignment(CellAlignment::Right),
            Cell::from("ON").set_alignment(CellAlignment::Right),
            Cell::from("Mean").set_alignment(CellAlignment::Right),
            Cell::from("Peak").set_alignment(CellAlignment::Right),
        ])
        .add_row(vec![
            Cell::from(name).add_attribute(Attribute::Bold),
            Cell::from(from).add_attribute(Attribute::Dim),
            Cell::from(to).add_attribute(Attribute::Dim),
            Cell::new(power.len()).set_alignment(CellAlignment::Right),
            Cell::from(format!("{:.1}%", on_share * 100.0))
                .set_alignment(CellAlignment::Right)
                .fg(if on_share > 0.0 { Color::Green } else { Color::Reset }),
            Cell::new(Watts::mean(power.values().copied())).set_alignment(CellAlignment::Right),
            Cell::new(peak_power(power)).set_alignment(CellAlignment::Right),
        ]);
    table
}

#[must_use]
pub fn build_intervals_table(intervals: &[OnInterval]) -> Table {
    let mut table = styled_table();
    table.set_header(vec![
        Cell::from("#").set_alignment(CellAlignment::Right),
        Cell::from("ON from"),
        Cell::from("ON till"),
        Cell::from("Samples").set_alignment(CellAlignment::Right),
        Cell::from("Mean power").set_alignment(CellAlignment::Right),
    ]);
    for (index, interval) in intervals.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
            Cell::from(format_timestamp(interval.first)).fg(Color::Green),
            Cell::from(format_timestamp(interval.last)),
            Cell::new(interval.n_samples).set_alignment(CellAlignment::Right),
            Cell::new(interval.mean_power).set_alignment(CellAlignment::Right),
        ]);
    }
    if intervals.is_empty() {
        table.add_row(vec![Cell::from(""), Cell::from(ApplianceState::Off).fg(Color::DarkGrey)]);
    }
    table
}

#[must_use]
pub fn build_appliances_table(predictions: &Predictions) -> Table {
    let mut table = styled_table();
    table.set_header(vec![
        Cell::from("Appliance").add_attribute(Attribute::Bold),
        Cell::from("Samples").set_alignment(CellAlignment::Right),
        Cell::from("Mean").set_alignment(CellAlignment::Right),
        Cell::from("Peak").set_alignment(CellAlignment::Right),
    ]);
    for (name, power) in predictions {
        table.add_row(vec![
            Cell::from(name),
            Cell::new(power.len()).set_alignment(CellAlignment::Right),
            Cell::new(Watts::mean(power.values().copied())).set_alignment(CellAlignment::Right),
            Cell::new(peak_power(power)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn peak_power(power: &PowerSeries) -> Watts {
    power.values().copied().fold(Watts::ZERO, |peak, power| if power > peak { power } else { peak })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::{series::tests::power_series, state::ApplianceState::*};

    #[test]
    fn test_buckets() {
        assert_eq!(buckets(10, 4).collect_vec(), vec![0..2, 2..5, 5..7, 7..10]);
        assert_eq!(buckets(2, 4).collect_vec(), vec![0..1, 1..2]);
        assert!(buckets(0, 4).next().is_none());
    }

    #[test]
    fn test_power_sparkline() {
        let power = power_series([0.0, 0.0, 50.0, 50.0, 100.0, 100.0]);
        assert_eq!(power_sparkline(&power, 3), "▁▅█");
        assert_eq!(power_sparkline(&power_series([0.0; 4]), 8), "▁▁▁▁");
    }

    #[test]
    fn test_state_strip() {
        let power = power_series([0.0; 6]);
        let states = power.with_values([Off, Off, Off, On, On, On]);
        assert_eq!(state_strip(&states, 6), "▁▁▁███");
        assert_eq!(state_strip(&states, 2), "▁█");
        assert_eq!(state_strip(&states, 3), "▁▄█");
    }

    #[test]
    fn test_peak_power() {
        assert_abs_diff_eq!(peak_power(&power_series([10.0, 30.0, 20.0])).0, 30.0);
        assert_abs_diff_eq!(peak_power(&PowerSeries::default()).0, 0.0);
    }

    #[test]
    fn test_render_appliance() {
        let power = power_series([0.0, 2000.0, 2000.0, 0.0]);
        let states = power.with_values([Off, On, On, Off]);
        let rendered = render_appliance("kettle", &power, &states);
        assert!(rendered.starts_with("kettle usage with ON/OFF states"));
        assert!(rendered.contains("50.0%"));
        assert!(rendered.contains("2000.0 W"));
    }

    #[test]
    fn test_appliances_table() {
        let predictions = Predictions::from([("fridge".to_owned(), power_series([80.0, 90.0]))]);
        let table = build_appliances_table(&predictions).to_string();
        assert!(table.contains("fridge"));
        assert!(table.contains("90.0 W"));
    }
}
