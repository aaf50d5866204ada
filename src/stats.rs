//! Aggregation over the delay dataset: summary totals, monthly delay-rate
//! series, and the delay-cause breakdown.
//!
//! Every operation filters to one (airport, carrier) pair first. An empty
//! filtered subset is reported as `None` — "no such combination" is a
//! different outcome than all-zero data. A subset whose summed arrivals are
//! zero produces `delay_percent: None` (an undefined rate), never a crash
//! and never a silent 0%.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{Dataset, DelayRecord};

/// The resolved (airport, carrier) pair a query runs under. Airport codes
/// are matched exactly; callers upper-case user input before building one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryKey {
    pub airport: String,
    pub carrier_name: String,
}

impl QueryKey {
    pub fn new(airport: impl Into<String>, carrier_name: impl Into<String>) -> Self {
        QueryKey {
            airport: airport.into(),
            carrier_name: carrier_name.into(),
        }
    }
}

/// Overall arrival/delay totals for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_arrivals: u64,
    pub total_delayed: u64,
    /// Percent of arrivals delayed 15+ minutes, rounded to 2 decimals.
    /// `None` when the subset had no arrivals to divide by.
    pub delay_percent: Option<f64>,
}

/// How the monthly series collapses time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesMode {
    /// One point per calendar month 1–12, summed across all years.
    AverageByMonth,
    /// One point per (year, month), in chronological order.
    Timeline,
}

/// Temporal key of a series point: a bare month in average mode, a calendar
/// date (first of the month) in timeline mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TemporalKey {
    Month(u32),
    Date(NaiveDate),
}

/// One point of the monthly delay-rate series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub key: TemporalKey,
    pub delay_percent: Option<f64>,
}

/// The five delay-cause categories tracked by the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DelayCause {
    Carrier,
    Weather,
    Nas,
    Security,
    LateAircraft,
}

impl DelayCause {
    pub const ALL: [DelayCause; 5] = [
        DelayCause::Carrier,
        DelayCause::Weather,
        DelayCause::Nas,
        DelayCause::Security,
        DelayCause::LateAircraft,
    ];

    /// Display label, as shown in chart legends.
    pub fn label(&self) -> &'static str {
        match self {
            DelayCause::Carrier => "Carrier Delay",
            DelayCause::Weather => "Weather Delay",
            DelayCause::Nas => "NAS Delay",
            DelayCause::Security => "Security Delay",
            DelayCause::LateAircraft => "Late Aircraft",
        }
    }

    fn minutes(&self, r: &DelayRecord) -> f64 {
        let v = match self {
            DelayCause::Carrier => r.carrier_delay,
            DelayCause::Weather => r.weather_delay,
            DelayCause::Nas => r.nas_delay,
            DelayCause::Security => r.security_delay,
            DelayCause::LateAircraft => r.late_aircraft_delay,
        };
        v.unwrap_or(0.0)
    }
}

/// Summed delay minutes attributed to one cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CauseTotal {
    pub cause: DelayCause,
    pub label: &'static str,
    pub minutes: f64,
}

fn matching<'a>(dataset: &'a Dataset, key: &QueryKey) -> Vec<&'a DelayRecord> {
    let subset: Vec<&DelayRecord> = dataset
        .records()
        .iter()
        .filter(|r| r.airport == key.airport && r.carrier_name == key.carrier_name)
        .collect();

    debug!(
        airport = %key.airport,
        carrier = %key.carrier_name,
        rows = subset.len(),
        "Filtered dataset for query"
    );
    subset
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Delay percentage from float sums; `None` when there is nothing to divide by.
fn percent(delayed: f64, arrivals: f64) -> Option<f64> {
    if arrivals == 0.0 {
        None
    } else {
        Some(round2(delayed / arrivals * 100.0))
    }
}

/// Computes overall totals and the delay percentage for the query pair.
/// Returns `None` when no records match.
pub fn compute_summary(dataset: &Dataset, key: &QueryKey) -> Option<SummaryStats> {
    let subset = matching(dataset, key);
    if subset.is_empty() {
        return None;
    }

    let total_arrivals: f64 = subset.iter().map(|r| r.arrivals()).sum();
    let total_delayed: f64 = subset.iter().map(|r| r.delayed()).sum();

    Some(SummaryStats {
        total_arrivals: total_arrivals as u64,
        total_delayed: total_delayed as u64,
        delay_percent: percent(total_delayed, total_arrivals),
    })
}

/// Computes the per-month delay-rate series for the query pair under the
/// given mode. Returns `None` when no records match.
pub fn compute_monthly_series(
    dataset: &Dataset,
    key: &QueryKey,
    mode: SeriesMode,
) -> Option<Vec<SeriesPoint>> {
    let subset = matching(dataset, key);
    if subset.is_empty() {
        return None;
    }

    let points = match mode {
        SeriesMode::AverageByMonth => {
            let mut groups: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
            for r in &subset {
                let entry = groups.entry(r.month).or_insert((0.0, 0.0));
                entry.0 += r.arrivals();
                entry.1 += r.delayed();
            }

            groups
                .into_iter()
                .map(|(month, (arrivals, delayed))| SeriesPoint {
                    key: TemporalKey::Month(month),
                    delay_percent: percent(delayed, arrivals),
                })
                .collect()
        }
        SeriesMode::Timeline => {
            let mut groups: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
            for r in &subset {
                let entry = groups.entry((r.year, r.month)).or_insert((0.0, 0.0));
                entry.0 += r.arrivals();
                entry.1 += r.delayed();
            }

            groups
                .into_iter()
                .filter_map(|((year, month), (arrivals, delayed))| {
                    // month outside 1-12 cannot form a date; skip the group
                    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
                    Some(SeriesPoint {
                        key: TemporalKey::Date(date),
                        delay_percent: percent(delayed, arrivals),
                    })
                })
                .collect()
        }
    };

    Some(points)
}

/// Sums delay minutes per cause over the query pair, dropping causes with no
/// positive contribution. Returns `None` when no records match.
pub fn compute_cause_breakdown(dataset: &Dataset, key: &QueryKey) -> Option<Vec<CauseTotal>> {
    let subset = matching(dataset, key);
    if subset.is_empty() {
        return None;
    }

    let totals = DelayCause::ALL
        .iter()
        .map(|cause| CauseTotal {
            cause: *cause,
            label: cause.label(),
            minutes: subset.iter().map(|r| cause.minutes(r)).sum(),
        })
        .filter(|t| t.minutes > 0.0)
        .collect();

    Some(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn record(
        year: i32,
        month: u32,
        airport: &str,
        carrier: &str,
        arrivals: f64,
        delayed: f64,
    ) -> DelayRecord {
        DelayRecord {
            year,
            month,
            airport: airport.to_string(),
            carrier_name: carrier.to_string(),
            arr_flights: Some(arrivals),
            arr_del15: Some(delayed),
            ..Default::default()
        }
    }

    // Round-trips synthetic rows through CSV so tests exercise the same
    // ingestion path production uses.
    fn dataset(records: Vec<DelayRecord>) -> Dataset {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "year",
            "month",
            "airport",
            "carrier_name",
            "arr_flights",
            "arr_del15",
            "carrier_delay",
            "weather_delay",
            "nas_delay",
            "security_delay",
            "late_aircraft_delay",
        ])
        .unwrap();
        for r in &records {
            wtr.write_record([
                r.year.to_string(),
                r.month.to_string(),
                r.airport.clone(),
                r.carrier_name.clone(),
                r.arr_flights.map_or(String::new(), |v| v.to_string()),
                r.arr_del15.map_or(String::new(), |v| v.to_string()),
                r.carrier_delay.map_or(String::new(), |v| v.to_string()),
                r.weather_delay.map_or(String::new(), |v| v.to_string()),
                r.nas_delay.map_or(String::new(), |v| v.to_string()),
                r.security_delay.map_or(String::new(), |v| v.to_string()),
                r.late_aircraft_delay
                    .map_or(String::new(), |v| v.to_string()),
            ])
            .unwrap();
        }
        let bytes = wtr.into_inner().unwrap();
        Dataset::from_reader(bytes.as_slice()).unwrap()
    }

    const DELTA: &str = "Delta Air Lines Inc.";

    fn lax_delta() -> QueryKey {
        QueryKey::new("LAX", DELTA)
    }

    #[test]
    fn test_summary_known_values() {
        let ds = dataset(vec![
            record(2023, 1, "LAX", DELTA, 100.0, 10.0),
            record(2023, 2, "LAX", DELTA, 50.0, 5.0),
        ]);

        let stats = compute_summary(&ds, &lax_delta()).unwrap();
        assert_eq!(stats.total_arrivals, 150);
        assert_eq!(stats.total_delayed, 15);
        assert_eq!(stats.delay_percent, Some(10.0));
    }

    #[test]
    fn test_summary_rounds_to_two_decimals() {
        let ds = dataset(vec![record(2023, 1, "LAX", DELTA, 3.0, 1.0)]);
        let stats = compute_summary(&ds, &lax_delta()).unwrap();
        assert_eq!(stats.delay_percent, Some(33.33));
    }

    #[test]
    fn test_summary_no_data_for_unknown_pair() {
        let ds = dataset(vec![record(2023, 1, "LAX", DELTA, 100.0, 10.0)]);
        assert!(compute_summary(&ds, &QueryKey::new("JFK", DELTA)).is_none());
        assert!(compute_summary(&ds, &QueryKey::new("LAX", "Spirit Airlines")).is_none());
    }

    #[test]
    fn test_summary_airport_match_is_case_sensitive() {
        let ds = dataset(vec![record(2023, 1, "LAX", DELTA, 100.0, 10.0)]);
        assert!(compute_summary(&ds, &QueryKey::new("lax", DELTA)).is_none());
    }

    #[test]
    fn test_summary_zero_arrivals_is_undefined_not_zero() {
        let ds = dataset(vec![record(2023, 1, "LAX", DELTA, 0.0, 0.0)]);

        let stats = compute_summary(&ds, &lax_delta()).unwrap();
        assert_eq!(stats.total_arrivals, 0);
        assert_eq!(stats.delay_percent, None);
    }

    #[test]
    fn test_series_average_mode_collapses_years() {
        let ds = dataset(vec![
            record(2022, 3, "LAX", DELTA, 100.0, 10.0),
            record(2023, 3, "LAX", DELTA, 100.0, 30.0),
        ]);

        let series = compute_monthly_series(&ds, &lax_delta(), SeriesMode::AverageByMonth).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, TemporalKey::Month(3));
        assert_eq!(series[0].delay_percent, Some(20.0));
    }

    #[test]
    fn test_series_timeline_mode_keeps_years_apart() {
        let ds = dataset(vec![
            record(2023, 3, "LAX", DELTA, 100.0, 30.0),
            record(2022, 3, "LAX", DELTA, 100.0, 10.0),
        ]);

        let series = compute_monthly_series(&ds, &lax_delta(), SeriesMode::Timeline).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series[0].key,
            TemporalKey::Date(NaiveDate::from_ymd_opt(2022, 3, 1).unwrap())
        );
        assert_eq!(series[0].delay_percent, Some(10.0));
        assert_eq!(
            series[1].key,
            TemporalKey::Date(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap())
        );
        assert_eq!(series[1].delay_percent, Some(30.0));
    }

    #[test]
    fn test_series_orders_months_and_skips_absent_ones() {
        let ds = dataset(vec![
            record(2023, 11, "LAX", DELTA, 100.0, 5.0),
            record(2023, 2, "LAX", DELTA, 100.0, 10.0),
        ]);

        let series = compute_monthly_series(&ds, &lax_delta(), SeriesMode::AverageByMonth).unwrap();
        let months: Vec<_> = series.iter().map(|p| p.key).collect();
        assert_eq!(months, vec![TemporalKey::Month(2), TemporalKey::Month(11)]);
    }

    #[test]
    fn test_series_zero_arrival_group_is_undefined() {
        let ds = dataset(vec![record(2023, 1, "LAX", DELTA, 0.0, 0.0)]);
        let series = compute_monthly_series(&ds, &lax_delta(), SeriesMode::AverageByMonth).unwrap();
        assert_eq!(series[0].delay_percent, None);
    }

    #[test]
    fn test_series_no_data() {
        let ds = dataset(vec![]);
        assert!(compute_monthly_series(&ds, &lax_delta(), SeriesMode::Timeline).is_none());
    }

    #[test]
    fn test_cause_breakdown_drops_zero_causes() {
        let mut r = record(2023, 1, "LAX", DELTA, 100.0, 10.0);
        r.carrier_delay = Some(120.0);
        r.weather_delay = Some(0.0);
        let ds = dataset(vec![r]);

        let causes = compute_cause_breakdown(&ds, &lax_delta()).unwrap();
        assert_eq!(causes.len(), 1);
        assert_eq!(causes[0].cause, DelayCause::Carrier);
        assert_eq!(causes[0].label, "Carrier Delay");
        assert_eq!(causes[0].minutes, 120.0);
    }

    #[test]
    fn test_cause_breakdown_sums_across_rows() {
        let mut a = record(2023, 1, "LAX", DELTA, 100.0, 10.0);
        a.nas_delay = Some(30.0);
        a.late_aircraft_delay = Some(45.0);
        let mut b = record(2023, 2, "LAX", DELTA, 50.0, 5.0);
        b.nas_delay = Some(20.0);
        let ds = dataset(vec![a, b]);

        let causes = compute_cause_breakdown(&ds, &lax_delta()).unwrap();
        assert_eq!(causes.len(), 2);
        assert_eq!(causes[0].cause, DelayCause::Nas);
        assert_eq!(causes[0].minutes, 50.0);
        assert_eq!(causes[1].cause, DelayCause::LateAircraft);
        assert_eq!(causes[1].minutes, 45.0);
    }

    #[test]
    fn test_cause_breakdown_no_data() {
        let ds = dataset(vec![record(2023, 1, "SEA", DELTA, 10.0, 1.0)]);
        assert!(compute_cause_breakdown(&ds, &lax_delta()).is_none());
    }

    #[test]
    fn test_operations_are_idempotent() {
        let ds = dataset(vec![
            record(2023, 1, "LAX", DELTA, 100.0, 10.0),
            record(2023, 2, "LAX", DELTA, 50.0, 5.0),
        ]);
        let key = lax_delta();

        assert_eq!(compute_summary(&ds, &key), compute_summary(&ds, &key));
        assert_eq!(
            compute_monthly_series(&ds, &key, SeriesMode::Timeline),
            compute_monthly_series(&ds, &key, SeriesMode::Timeline)
        );
        assert_eq!(
            compute_cause_breakdown(&ds, &key),
            compute_cause_breakdown(&ds, &key)
        );
    }
}
