//! Print a source file's classified columns and leading rows.
//!
//! Usage: inspect_table <file.csv>

use anyhow::{bail, Context, Result};
use envtrend::{classify::Classifier, ingest::read_table};
use std::{env, path::Path};

fn main() -> Result<()> {
    let path = match env::args().nth(1) {
        Some(p) => p,
        None => bail!("usage: inspect_table <file.csv>"),
    };

    let table = read_table(Path::new(&path)).with_context(|| format!("reading {path}"))?;
    let roles = Classifier::default().classify(&table.headers);

    println!("file: {path}");
    println!("columns ({}):", table.headers.len());
    for (idx, name) in table.headers.iter().enumerate() {
        let mut tags = Vec::new();
        if roles.time == Some(idx) {
            tags.push("time");
        }
        if roles.region == Some(idx) {
            tags.push("region");
        }
        if roles.label == Some(idx) {
            tags.push("label");
        }
        if roles.grade == Some(idx) {
            tags.push("grade");
        }
        if roles.metrics.contains(&idx) {
            tags.push("metric");
        }
        let tag = if tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", tags.join(", "))
        };
        println!("  {idx:>2}  {name}{tag}");
    }

    println!("rows: {}", table.rows.len());
    for row in table.rows.iter().take(5) {
        println!("  {}", row.join(" | "));
    }

    Ok(())
}
