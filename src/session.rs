//! Interactive query session.
//!
//! Holds the per-session state the presentation layer needs between
//! renders: the last resolved query and the series view-mode toggle. The
//! state lives in an explicit struct owned by the loop, never in a global.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::info;

use crate::dataset::Dataset;
use crate::matcher::resolve_airline;
use crate::output::{QueryReport, render_report};
use crate::stats::{QueryKey, SeriesMode};

/// Mutable state carried across one interactive session.
#[derive(Debug)]
pub struct SessionState {
    pub last_query: Option<QueryKey>,
    pub mode: SeriesMode,
}

impl SessionState {
    pub fn new(mode: SeriesMode) -> Self {
        SessionState {
            last_query: None,
            mode,
        }
    }

    /// Flips between the two series view modes.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            SeriesMode::AverageByMonth => SeriesMode::Timeline,
            SeriesMode::Timeline => SeriesMode::AverageByMonth,
        };
    }
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn render_query(
    dataset: &Dataset,
    state: &SessionState,
    key: &QueryKey,
    out: &mut impl Write,
) -> Result<()> {
    match QueryReport::build(dataset, key.clone(), state.mode) {
        Some(report) => render_report(out, &report)?,
        None => writeln!(
            out,
            "Nothing found for {} at {}.",
            key.carrier_name, key.airport
        )?,
    }
    Ok(())
}

/// Runs the interactive prompt loop until EOF or `quit`.
///
/// Commands: an airport code starts a new query (airline is prompted next),
/// `mode` toggles the series view and re-renders the last query, `quit`
/// ends the session.
pub fn run(
    dataset: &Dataset,
    initial_mode: SeriesMode,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let mut state = SessionState::new(initial_mode);

    if let Some((min, max)) = dataset.year_range() {
        writeln!(out, "Flight delay tool. Data covers {min} to {max}.")?;
    }
    writeln!(
        out,
        "Type an airport code to search, 'mode' to switch the monthly view, 'quit' to exit."
    )?;

    loop {
        write!(out, "\nairport> ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else { break };

        match line.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "mode" => {
                state.toggle_mode();
                info!(mode = ?state.mode, "Series view mode toggled");
                match state.last_query.clone() {
                    Some(key) => render_query(dataset, &state, &key, out)?,
                    None => writeln!(out, "No query yet; enter an airport code first.")?,
                }
            }
            airport => {
                write!(out, "airline> ")?;
                out.flush()?;
                let Some(airline) = read_line(input)? else { break };
                if airline.is_empty() {
                    continue;
                }

                let candidates = dataset.carrier_names();
                let Some(carrier) = resolve_airline(&airline, candidates.iter().copied()) else {
                    writeln!(out, "Could not find a close match for that airline.")?;
                    continue;
                };

                writeln!(out, "Searched airline: {carrier}")?;
                let key = QueryKey::new(airport.to_uppercase(), carrier);
                render_query(dataset, &state, &key, out)?;
                state.last_query = Some(key);
            }
        }
    }

    Ok(())
}
