use anyhow::{Context, Result};
use envtrend::{
    aggregate::{range::TimeRange, DataKind},
    classify::Classifier,
    config::Config,
    ingest::catalog::Catalog,
    pipeline,
};
use std::{env, fs, path::Path};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = env::args().nth(1).unwrap_or_else(|| "envtrend.yaml".into());
    let cfg = Config::load(Path::new(&config_path))?;
    fs::create_dir_all(&cfg.out_dir)
        .with_context(|| format!("creating output directory {}", cfg.out_dir.display()))?;

    // ─── 3) index the data directory ─────────────────────────────────
    let catalog = Catalog::scan(&cfg.data_dir).context("scanning data directory")?;
    if catalog.is_empty() {
        warn!(dir = %cfg.data_dir.display(), "no source files; exit");
        return Ok(());
    }
    info!("{} source files cataloged", catalog.len());

    // ─── 4) summarize every source, one JSON report each ─────────────
    let classifier = Classifier::default();
    let range = TimeRange::full_year();
    let mut rng = rand::thread_rng();
    let mut written = 0usize;

    for (name, profile) in catalog.files() {
        let kind = match DataKind::from_token(name) {
            Some(k) => k,
            None => {
                warn!(name, "cannot infer data kind from file name, skipping");
                continue;
            }
        };

        match pipeline::monthly_summary(
            &profile.path,
            kind,
            None,
            &range,
            &classifier,
            &cfg,
            &mut rng,
        ) {
            Ok(report) => {
                let stem = name.trim_end_matches(".csv");
                let out_path = cfg.out_dir.join(format!("{stem}.json"));
                let json = serde_json::to_string_pretty(&report)?;
                fs::write(&out_path, json)
                    .with_context(|| format!("writing {}", out_path.display()))?;
                info!(name, out = %out_path.display(), "report written");
                written += 1;
            }
            Err(e) => {
                error!(name, "summary failed: {e}");
            }
        }
    }

    info!("done, {written} reports written");
    Ok(())
}
