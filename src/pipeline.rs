use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::aggregate::long::{aggregate_long, WaterMetric};
use crate::aggregate::range::TimeRange;
use crate::aggregate::wide::{aggregate_wide, WideOptions};
use crate::aggregate::{DataKind, MonthlyAggregate};
use crate::classify::Classifier;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::forecast;
use crate::ingest::read_table;
use crate::repair::repair_series;
use crate::report::{Dataset, ForecastReport, OverviewBlock, PredictionBlock, SummaryReport};
use crate::timekey::MonthKey;

/// Read one source file and produce its aggregated monthly view for the
/// requested kind, region, and sub-period.
pub fn monthly_summary<R: Rng>(
    path: &Path,
    kind: DataKind,
    region: Option<&str>,
    range: &TimeRange,
    classifier: &Classifier,
    cfg: &Config,
    rng: &mut R,
) -> Result<SummaryReport> {
    let agg = aggregate_file(path, kind, region, classifier, cfg)?;

    let keys = range.filter(&agg.keys);
    if keys.is_empty() {
        return Err(PipelineError::InsufficientData(format!(
            "no data for the requested period in {}",
            path.display()
        )));
    }

    let labels: Vec<String> = keys.iter().map(|k| k.short_label()).collect();

    let mut datasets = Vec::with_capacity(agg.series.len() + agg.cumulative.len());
    let mut repaired_by_series = Vec::with_capacity(agg.series.len());
    for series in &agg.series {
        let repaired = repair_series(&series.values_for(&keys), rng);
        datasets.push(Dataset {
            name: series.name.clone(),
            data: repaired.iter().map(|v| round2(*v)).collect(),
        });
        repaired_by_series.push(repaired);
    }
    // Cumulative lines are derived data; they ride along unrepaired.
    for series in &agg.cumulative {
        datasets.push(Dataset {
            name: series.name.clone(),
            data: keys
                .iter()
                .map(|k| series.value_at(*k).unwrap_or(0.0))
                .collect(),
        });
    }

    let (table_header, table_data) = if kind.is_wide() {
        render_wide_table(&agg, &keys, &labels, &repaired_by_series)
    } else {
        render_long_table(&agg, &keys, &labels, &repaired_by_series)
    };

    info!(
        path = %path.display(),
        kind = kind.as_str(),
        months = keys.len(),
        "summary ready"
    );

    Ok(SummaryReport {
        labels,
        datasets,
        overview: OverviewBlock {
            record_count: agg.overview.record_count,
            station_count: agg.overview.station_count,
            time_span: agg.overview.time_span.clone(),
            quality: agg.overview.quality.clone(),
            averages: agg.overview.averages.clone(),
        },
        table_header,
        table_data,
    })
}

/// Project the primary metric of one source file `horizon` months past its
/// last observed month.
pub fn monthly_forecast<R: Rng>(
    path: &Path,
    kind: DataKind,
    region: Option<&str>,
    horizon: usize,
    classifier: &Classifier,
    cfg: &Config,
    rng: &mut R,
) -> Result<ForecastReport> {
    let agg = aggregate_file(path, kind, region, classifier, cfg)?;
    if agg.keys.is_empty() {
        return Err(PipelineError::InsufficientData(format!(
            "no monthly data in {}",
            path.display()
        )));
    }

    let primary = &agg.series[agg.primary];
    let history = repair_series(&primary.values_for(&agg.keys), rng);

    let last_label = agg.keys.last().expect("keys checked non-empty").to_string();
    let anchor = forecast::anchor_month(&last_label);
    let projection = forecast::project(&history, anchor, horizon, rng)?;

    info!(
        path = %path.display(),
        metric = %primary.name,
        horizon,
        trend = %projection.trend,
        "forecast ready"
    );

    Ok(ForecastReport {
        labels: agg.keys.iter().map(|k| k.to_string()).collect(),
        datasets: vec![Dataset {
            name: primary.name.clone(),
            data: history.iter().map(|v| round2(*v)).collect(),
        }],
        predictions: PredictionBlock {
            labels: projection.keys.iter().map(|k| k.to_string()).collect(),
            datasets: vec![Dataset {
                name: primary.name.clone(),
                data: projection.values,
            }],
        },
        trend: projection.trend,
    })
}

fn aggregate_file(
    path: &Path,
    kind: DataKind,
    region: Option<&str>,
    classifier: &Classifier,
    cfg: &Config,
) -> Result<MonthlyAggregate> {
    let table = read_table(path)?;
    let roles = classifier.classify(&table.headers);
    let region = region.filter(|r| !cfg.is_citywide(r));

    if kind.is_wide() {
        aggregate_wide(
            &table,
            &roles,
            &WideOptions {
                region,
                sentinels: &cfg.overall_sentinels,
                good_max: cfg.quality.good_max,
                light_max: cfg.quality.light_max,
            },
        )
    } else {
        aggregate_long(&table, &roles, region)
    }
}

fn render_wide_table(
    agg: &MonthlyAggregate,
    keys: &[MonthKey],
    labels: &[String],
    repaired: &[Vec<f64>],
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec!["月份".to_string()];
    header.extend(agg.series.iter().map(|s| s.name.clone()));
    header.push("峰值站点".to_string());

    let rows = keys
        .iter()
        .enumerate()
        .map(|(row_idx, key)| {
            let mut row = vec![labels[row_idx].clone()];
            row.extend(repaired.iter().map(|values| format!("{:.0}", values[row_idx])));
            row.push(agg.sites.get(key).cloned().unwrap_or_else(|| "-".into()));
            row
        })
        .collect();

    (header, rows)
}

fn render_long_table(
    agg: &MonthlyAggregate,
    keys: &[MonthKey],
    labels: &[String],
    repaired: &[Vec<f64>],
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec!["月份".to_string()];
    header.extend(agg.series.iter().map(|s| s.name.clone()));
    header.push("水质类别".to_string());
    header.push("代表站点".to_string());

    let rows = keys
        .iter()
        .enumerate()
        .map(|(row_idx, key)| {
            let mut row = vec![labels[row_idx].clone()];
            for (series_idx, values) in repaired.iter().enumerate() {
                let decimals = WaterMetric::ALL[series_idx].decimals() as usize;
                row.push(format!("{:.*}", decimals, values[row_idx]));
            }
            row.push(agg.grades.get(key).cloned().unwrap_or_else(|| "-".into()));
            row.push(agg.sites.get(key).cloned().unwrap_or_else(|| "-".into()));
            row
        })
        .collect();

    (header, rows)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
