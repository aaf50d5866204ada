//! Dataset accessor for the BTS airline delay-cause CSV.
//!
//! The file is loaded once at startup and treated as immutable for the
//! lifetime of the process; everything downstream borrows the loaded
//! [`Dataset`].

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// One row of the delay dataset: arrival/delay counts and cause minutes for a
/// given year, month, airport, and carrier.
///
/// Numeric columns are optional because the source export leaves cells blank
/// for months with no reported data; a blank cell contributes zero to every
/// aggregate. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayRecord {
    pub year: i32,
    pub month: u32,
    pub airport: String,
    pub carrier_name: String,

    pub arr_flights: Option<f64>,
    pub arr_del15: Option<f64>,

    pub carrier_delay: Option<f64>,
    pub weather_delay: Option<f64>,
    pub nas_delay: Option<f64>,
    pub security_delay: Option<f64>,
    pub late_aircraft_delay: Option<f64>,
}

impl DelayRecord {
    pub fn arrivals(&self) -> f64 {
        self.arr_flights.unwrap_or(0.0)
    }

    pub fn delayed(&self) -> f64 {
        self.arr_del15.unwrap_or(0.0)
    }
}

/// The full delay dataset, read-only after load.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<DelayRecord>,
}

impl Dataset {
    /// Loads the dataset from a CSV file. Failure here is fatal to the
    /// process: no query can run without the data.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        let dataset = Self::from_reader(file)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;

        info!(
            path = %path.display(),
            records = dataset.records.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Reads CSV rows from any reader. Used directly by tests.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in rdr.deserialize() {
            let record: DelayRecord = result?;
            records.push(record);
        }

        Ok(Dataset { records })
    }

    pub fn records(&self) -> &[DelayRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct carrier names in first-appearance order. This order is the
    /// documented tie-break for fuzzy matching, so it must be deterministic.
    pub fn carrier_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for r in &self.records {
            if seen.insert(r.carrier_name.as_str()) {
                names.push(r.carrier_name.as_str());
            }
        }

        names
    }

    /// Inclusive (min, max) year span of the data, or `None` when empty.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let first = self.records.first()?.year;
        let span = self
            .records
            .iter()
            .fold((first, first), |(lo, hi), r| (lo.min(r.year), hi.max(r.year)));
        Some(span)
    }
}
