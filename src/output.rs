//! Report rendering for a resolved query.
//!
//! Produces the human-readable stdout report (metrics, monthly table with
//! bars, cause list) and the machine-readable JSON form.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::stats::{CauseTotal, QueryKey, SeriesMode, SeriesPoint, SummaryStats, TemporalKey};

/// Everything derived for one query, in one serializable bundle.
#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub query: QueryKey,
    pub mode: SeriesMode,
    pub summary: SummaryStats,
    pub monthly: Vec<SeriesPoint>,
    pub causes: Vec<CauseTotal>,
}

impl QueryReport {
    /// Runs all three aggregation operations for a resolved query.
    /// `None` means the pair has no matching records at all.
    pub fn build(
        dataset: &crate::dataset::Dataset,
        query: QueryKey,
        mode: SeriesMode,
    ) -> Option<Self> {
        let summary = crate::stats::compute_summary(dataset, &query)?;
        let monthly = crate::stats::compute_monthly_series(dataset, &query, mode)?;
        let causes = crate::stats::compute_cause_breakdown(dataset, &query)?;

        Some(QueryReport {
            query,
            mode,
            summary,
            monthly,
            causes,
        })
    }
}

/// Width of the longest bar in the monthly table.
const BAR_WIDTH: usize = 40;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_name(month: u32) -> String {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| format!("M{month}"))
}

fn format_key(key: &TemporalKey) -> String {
    match key {
        TemporalKey::Month(m) => month_name(*m),
        TemporalKey::Date(d) => d.format("%Y-%m").to_string(),
    }
}

fn format_percent(p: Option<f64>) -> String {
    match p {
        Some(p) => format!("{p:.2}%"),
        None => "n/a".to_string(),
    }
}

/// Renders the full report as text to the given writer.
pub fn render_report(out: &mut impl std::io::Write, report: &QueryReport) -> Result<()> {
    debug!(airport = %report.query.airport, carrier = %report.query.carrier_name, "Rendering report");

    writeln!(
        out,
        "\nResults for {} at {}",
        report.query.carrier_name, report.query.airport
    )?;
    writeln!(
        out,
        "  Total arrivals:            {}",
        report.summary.total_arrivals
    )?;
    writeln!(
        out,
        "  Delayed flights (15+ min): {}",
        report.summary.total_delayed
    )?;
    writeln!(
        out,
        "  Percent delayed:           {}",
        format_percent(report.summary.delay_percent)
    )?;

    let mode_label = match report.mode {
        SeriesMode::AverageByMonth => "by month, all years combined",
        SeriesMode::Timeline => "chronological",
    };
    writeln!(out, "\nMonthly delay rate ({mode_label}):")?;
    render_series(out, &report.monthly)?;

    writeln!(out, "\nDelay minutes by cause:")?;
    render_causes(out, &report.causes)?;

    Ok(())
}

/// Renders the monthly series as a table with proportional bars. Bars are
/// scaled to the largest defined percentage in the series.
pub fn render_series(out: &mut impl std::io::Write, series: &[SeriesPoint]) -> Result<()> {
    let max = series
        .iter()
        .filter_map(|p| p.delay_percent)
        .fold(0.0_f64, f64::max);

    for point in series {
        let bar = match point.delay_percent {
            Some(p) if max > 0.0 => {
                let len = ((p / max) * BAR_WIDTH as f64).round() as usize;
                "#".repeat(len)
            }
            _ => String::new(),
        };
        writeln!(
            out,
            "  {:>8}  {:>8}  {}",
            format_key(&point.key),
            format_percent(point.delay_percent),
            bar
        )?;
    }

    Ok(())
}

/// Renders the cause breakdown, one line per contributing cause.
pub fn render_causes(out: &mut impl std::io::Write, causes: &[CauseTotal]) -> Result<()> {
    if causes.is_empty() {
        writeln!(out, "  (no delay minutes recorded)")?;
        return Ok(());
    }

    for c in causes {
        writeln!(out, "  {:<16} {:>12.0} min", c.label, c.minutes)?;
    }

    Ok(())
}

/// Writes the report as pretty-printed JSON.
pub fn print_json(out: &mut impl std::io::Write, report: &QueryReport) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
    Ok(())
}
