pub mod long;
pub mod range;
pub mod wide;

use std::collections::BTreeMap;

use crate::timekey::MonthKey;

/// Closed set of source families. The token comes from the request (or a
/// file name); the variant picks the aggregation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Air,
    Water,
    River,
    Basin,
}

impl DataKind {
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.trim().to_lowercase();
        if t.contains("air") || t.contains("空气") || t.contains("aqi") {
            Some(DataKind::Air)
        } else if t.contains("river") || t.contains("河") {
            Some(DataKind::River)
        } else if t.contains("basin") || t.contains("流域") {
            Some(DataKind::Basin)
        } else if t.contains("water") || t.contains("水") {
            Some(DataKind::Water)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Air => "air",
            DataKind::Water => "water",
            DataKind::River => "river",
            DataKind::Basin => "basin",
        }
    }

    /// Air feeds are wide (one column per metric); the water family is
    /// long (one row per observation, metric named by a label column).
    pub fn is_wide(self) -> bool {
        matches!(self, DataKind::Air)
    }
}

/// One metric's ordered monthly values. Keys are ascending and unique;
/// duplicate source rows for a month were merged during aggregation.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub name: String,
    pub points: Vec<(MonthKey, Option<f64>)>,
}

impl MetricSeries {
    pub fn value_at(&self, key: MonthKey) -> Option<f64> {
        self.points
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| *v)
    }

    /// Values aligned to `keys`, absent months as `None`.
    pub fn values_for(&self, keys: &[MonthKey]) -> Vec<Option<f64>> {
        keys.iter().map(|k| self.value_at(*k)).collect()
    }
}

/// Per-aggregation summary; lives only inside the response it belongs to.
#[derive(Debug, Clone)]
pub struct Overview {
    pub record_count: usize,
    pub station_count: usize,
    pub time_span: String,
    pub quality: String,
    pub averages: BTreeMap<String, f64>,
}

/// Output of either aggregation policy.
#[derive(Debug, Clone)]
pub struct MonthlyAggregate {
    /// Months present in the source, ascending.
    pub keys: Vec<MonthKey>,
    pub series: Vec<MetricSeries>,
    /// Running cumulative sums of the monthly means (wide form only).
    pub cumulative: Vec<MetricSeries>,
    /// Wide form: station with the highest primary reading per month.
    /// Long form: representative site per month.
    pub sites: BTreeMap<MonthKey, String>,
    /// Most frequent categorical quality label per month (long form only).
    pub grades: BTreeMap<MonthKey, String>,
    pub overview: Overview,
    /// Index into `series` of the metric forecasts run on.
    pub primary: usize,
}

pub(crate) fn span_label(keys: &[MonthKey]) -> String {
    match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => format!("{} ~ {}", first, last),
        _ => String::new(),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
