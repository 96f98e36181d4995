use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::aggregate::{round_to, span_label, MetricSeries, MonthlyAggregate, Overview};
use crate::classify::ColumnRoles;
use crate::error::{PipelineError, Result};
use crate::ingest::Table;
use crate::timekey::MonthKey;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Semantic buckets for long-form water-quality observations. Closed set:
/// a label either lands in one of these or the row is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterMetric {
    Ph,
    DissolvedOxygen,
    Ammonia,
    Permanganate,
}

impl WaterMetric {
    pub const ALL: [WaterMetric; 4] = [
        WaterMetric::Ph,
        WaterMetric::DissolvedOxygen,
        WaterMetric::Ammonia,
        WaterMetric::Permanganate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WaterMetric::Ph => "pH",
            WaterMetric::DissolvedOxygen => "溶解氧",
            WaterMetric::Ammonia => "氨氮",
            WaterMetric::Permanganate => "高锰酸盐指数",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            WaterMetric::Ph => &["ph", "酸碱"],
            WaterMetric::DissolvedOxygen => &["溶解氧", "do"],
            WaterMetric::Ammonia => &["氨氮", "nh3", "nh4"],
            WaterMetric::Permanganate => &["高锰酸", "cod"],
        }
    }

    /// Display precision: pH to 2 decimals, concentrations to 3.
    pub fn decimals(self) -> i32 {
        match self {
            WaterMetric::Ph => 2,
            _ => 3,
        }
    }

    fn classify(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.keywords().iter().any(|k| lowered.contains(k)))
    }
}

#[derive(Default)]
struct MonthBucket {
    sums: [f64; WaterMetric::ALL.len()],
    counts: [usize; WaterMetric::ALL.len()],
    grades: BTreeMap<String, usize>,
    site: Option<String>,
}

/// Aggregate a long-form table (one row per observation, metric named by a
/// label column). Rows with no extractable number are skipped rather than
/// zeroed — a false zero would corrupt the bucket averages.
pub fn aggregate_long(
    table: &Table,
    roles: &ColumnRoles,
    region: Option<&str>,
) -> Result<MonthlyAggregate> {
    let time_idx = roles
        .time
        .ok_or_else(|| PipelineError::Schema("no time column in header".into()))?;
    let label_idx = roles
        .label
        .ok_or_else(|| PipelineError::Schema("no metric-label column in header".into()))?;

    let mut buckets: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();
    let mut stations: BTreeSet<String> = BTreeSet::new();
    let mut overall_grades: BTreeMap<String, usize> = BTreeMap::new();
    let mut used_rows = 0usize;

    for row in &table.rows {
        let site = roles
            .region
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("");
        if let Some(region) = region {
            if !site.contains(region) {
                continue;
            }
        }

        let raw_time = row.get(time_idx).map(|s| s.as_str()).unwrap_or("");
        let month = match MonthKey::from_raw(raw_time) {
            Some(m) => m,
            None => {
                debug!(raw_time, "dropping row with unparseable period");
                continue;
            }
        };

        let label = row.get(label_idx).map(|s| s.as_str()).unwrap_or("");
        let metric = match WaterMetric::classify(label) {
            Some(m) => m,
            None => {
                debug!(label, "label matches no bucket, skipping row");
                continue;
            }
        };
        let value = match extract_value(row, roles, label) {
            Some(v) => v,
            None => {
                debug!(label, "no extractable number, skipping row");
                continue;
            }
        };

        let bucket = buckets.entry(month).or_default();
        let slot = WaterMetric::ALL.iter().position(|m| *m == metric).unwrap();
        bucket.sums[slot] += value;
        bucket.counts[slot] += 1;

        if let Some(grade) = roles.grade.and_then(|idx| row.get(idx)) {
            if !grade.is_empty() {
                *bucket.grades.entry(grade.clone()).or_insert(0) += 1;
                *overall_grades.entry(grade.clone()).or_insert(0) += 1;
            }
        }
        if bucket.site.is_none() && !site.is_empty() {
            bucket.site = Some(site.to_string());
        }
        if !site.is_empty() {
            stations.insert(site.to_string());
        }
        used_rows += 1;
    }

    let keys: Vec<MonthKey> = buckets.keys().copied().collect();

    let mut series = Vec::with_capacity(WaterMetric::ALL.len());
    let mut averages = BTreeMap::new();
    for (slot, metric) in WaterMetric::ALL.into_iter().enumerate() {
        let mut points = Vec::with_capacity(keys.len());
        let mut total = 0.0;
        let mut months_with_data = 0usize;

        for (&month, bucket) in &buckets {
            let value = if bucket.counts[slot] > 0 {
                let mean = round_to(
                    bucket.sums[slot] / bucket.counts[slot] as f64,
                    metric.decimals(),
                );
                total += mean;
                months_with_data += 1;
                Some(mean)
            } else {
                None
            };
            points.push((month, value));
        }

        if months_with_data > 0 {
            averages.insert(
                metric.label().to_string(),
                round_to(total / months_with_data as f64, metric.decimals()),
            );
        }
        series.push(MetricSeries {
            name: metric.label().to_string(),
            points,
        });
    }

    let sites: BTreeMap<MonthKey, String> = buckets
        .iter()
        .filter_map(|(&month, b)| b.site.clone().map(|s| (month, s)))
        .collect();
    let grades: BTreeMap<MonthKey, String> = buckets
        .iter()
        .filter_map(|(&month, b)| mode(&b.grades).map(|g| (month, g)))
        .collect();

    let primary = series
        .iter()
        .position(|s| s.points.iter().any(|(_, v)| v.is_some()))
        .unwrap_or(0);

    let overview = Overview {
        record_count: used_rows,
        station_count: stations.len(),
        time_span: span_label(&keys),
        quality: mode(&overall_grades).unwrap_or_else(|| "unknown".to_string()),
        averages,
    };

    Ok(MonthlyAggregate {
        keys,
        series,
        cumulative: Vec::new(),
        sites,
        grades,
        overview,
        primary,
    })
}

/// The observation value: the first parsable metric cell, else numbers
/// embedded in the label text (a range like `"6.5-8.5"` averages to 7.5).
fn extract_value(row: &[String], roles: &ColumnRoles, label: &str) -> Option<f64> {
    for &idx in &roles.metrics {
        if let Some(cell) = row.get(idx) {
            if let Ok(v) = cell.trim().parse::<f64>() {
                if v.is_finite() {
                    return Some(v);
                }
            }
        }
    }
    let numbers: Vec<f64> = NUMBER
        .find_iter(label)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if numbers.is_empty() {
        None
    } else {
        Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
    }
}

/// Most frequent entry; ties break toward the lexicographically first key
/// so the result is deterministic.
fn mode(counts: &BTreeMap<String, usize>) -> Option<String> {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(k, _)| k.clone())
}
