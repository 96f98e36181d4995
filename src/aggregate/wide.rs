use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::aggregate::{round_to, span_label, MetricSeries, MonthlyAggregate, Overview};
use crate::classify::ColumnRoles;
use crate::error::{PipelineError, Result};
use crate::ingest::Table;
use crate::timekey::MonthKey;

/// Wide-form knobs, carried in from configuration and the request.
#[derive(Debug, Clone)]
pub struct WideOptions<'a> {
    /// Keep only rows whose site cell contains this value. `None` = citywide.
    pub region: Option<&'a str>,
    /// Site-cell values marking pre-computed overall-average pseudo-rows;
    /// those are excluded so the mean is not double-counted.
    pub sentinels: &'a [String],
    /// Primary-average thresholds for the coarse quality label.
    pub good_max: f64,
    pub light_max: f64,
}

/// Column names that mark the primary metric; falls back to the first
/// metric column when none matches.
const PRIMARY_NAMES: &[&str] = &["pm2.5", "pm2_5", "pm25"];

struct MonthBucket {
    sums: Vec<f64>,
    count: usize,
    best: Option<(f64, String)>,
}

/// Aggregate a wide-form table (one row per station per month, metrics as
/// separate columns) into monthly means, cumulative sums, and per-month
/// top contributors. Unparsable numeric cells count as zero — intentional
/// per-source behavior, matched by the skip rule on the long form.
pub fn aggregate_wide(
    table: &Table,
    roles: &ColumnRoles,
    opts: &WideOptions<'_>,
) -> Result<MonthlyAggregate> {
    let time_idx = roles
        .time
        .ok_or_else(|| PipelineError::Schema("no time column in header".into()))?;
    if roles.metrics.is_empty() {
        return Err(PipelineError::Schema("no numeric metric columns".into()));
    }

    let primary_pos = roles
        .metrics
        .iter()
        .position(|&idx| {
            let name = table.headers[idx].to_lowercase();
            PRIMARY_NAMES.iter().any(|p| name.contains(p))
        })
        .unwrap_or(0);

    let mut buckets: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();
    let mut stations: BTreeSet<String> = BTreeSet::new();
    let mut used_rows = 0usize;

    for row in &table.rows {
        let site = roles
            .region
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("");

        // Pre-computed overall rows would double-count the mean.
        if !site.is_empty() && opts.sentinels.iter().any(|s| site.contains(s.as_str())) {
            continue;
        }
        if let Some(region) = opts.region {
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

        let bucket = buckets.entry(month).or_insert_with(|| MonthBucket {
            sums: vec![0.0; roles.metrics.len()],
            count: 0,
            best: None,
        });

        for (pos, &idx) in roles.metrics.iter().enumerate() {
            let value = parse_numeric(row.get(idx).map(|s| s.as_str()).unwrap_or(""));
            bucket.sums[pos] += value;
            if pos == primary_pos {
                let better = bucket.best.as_ref().map_or(true, |(top, _)| value > *top);
                if better {
                    bucket.best = Some((value, site.to_string()));
                }
            }
        }
        bucket.count += 1;
        used_rows += 1;
        if !site.is_empty() {
            stations.insert(site.to_string());
        }
    }

    let keys: Vec<MonthKey> = buckets.keys().copied().collect();

    // Monthly means (integer-rounded) and their running cumulative sums.
    let mut series = Vec::with_capacity(roles.metrics.len());
    let mut cumulative = Vec::with_capacity(roles.metrics.len());
    let mut averages = BTreeMap::new();

    for (pos, &idx) in roles.metrics.iter().enumerate() {
        let name = table.headers[idx].clone();
        let mut points = Vec::with_capacity(keys.len());
        let mut cum_points = Vec::with_capacity(keys.len());
        let mut running = 0.0;

        for (&month, bucket) in &buckets {
            let mean = (bucket.sums[pos] / bucket.count as f64).round();
            running += mean;
            points.push((month, Some(mean)));
            cum_points.push((month, Some(running)));
        }

        if !points.is_empty() {
            let total: f64 = points.iter().filter_map(|(_, v)| *v).sum();
            averages.insert(name.clone(), round_to(total / points.len() as f64, 2));
        }

        series.push(MetricSeries {
            name: name.clone(),
            points,
        });
        cumulative.push(MetricSeries {
            name: format!("{} (cumulative)", name),
            points: cum_points,
        });
    }

    let sites: BTreeMap<MonthKey, String> = buckets
        .iter()
        .filter_map(|(&month, bucket)| {
            bucket
                .best
                .as_ref()
                .filter(|(_, site)| !site.is_empty())
                .map(|(_, site)| (month, site.clone()))
        })
        .collect();

    let primary_name = &table.headers[roles.metrics[primary_pos]];
    let primary_avg = averages.get(primary_name.as_str()).copied().unwrap_or(0.0);
    let quality = quality_label(primary_avg, opts);

    let overview = Overview {
        record_count: used_rows,
        station_count: stations.len(),
        time_span: span_label(&keys),
        quality,
        averages,
    };

    Ok(MonthlyAggregate {
        keys,
        series,
        cumulative,
        sites,
        grades: BTreeMap::new(),
        overview,
        primary: primary_pos,
    })
}

fn parse_numeric(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            if !cell.trim().is_empty() {
                debug!(cell, "unparsable numeric cell, counting as zero");
            }
            0.0
        }
    }
}

fn quality_label(primary_avg: f64, opts: &WideOptions<'_>) -> String {
    if primary_avg <= opts.good_max {
        "good".to_string()
    } else if primary_avg <= opts.light_max {
        "lightly polluted".to_string()
    } else {
        "polluted".to_string()
    }
}
