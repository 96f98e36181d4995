//! Forecast one source file's primary metric and print the JSON report.
//!
//! Usage: trend <file.csv> [months] [kind]

use anyhow::{bail, Context, Result};
use envtrend::{aggregate::DataKind, classify::Classifier, config::Config, pipeline};
use std::{env, path::Path};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => bail!("usage: trend <file.csv> [months] [kind]"),
    };

    let cfg = Config::default();
    let horizon = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("bad horizon {raw:?}"))?,
        None => cfg.forecast.horizon,
    };
    let kind = match args.next() {
        Some(token) => match DataKind::from_token(&token) {
            Some(k) => k,
            None => bail!("unknown data kind {token:?}"),
        },
        // fall back to guessing from the file name, air if nothing matches
        None => DataKind::from_token(&path).unwrap_or(DataKind::Air),
    };

    let report = pipeline::monthly_forecast(
        Path::new(&path),
        kind,
        None,
        horizon,
        &Classifier::default(),
        &cfg,
        &mut rand::thread_rng(),
    )
    .with_context(|| format!("forecasting {path}"))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
