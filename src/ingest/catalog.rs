use std::collections::BTreeMap;
use std::path::PathBuf;

use glob::glob;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ingest::read_table;

/// Sample rows kept per file, enough to eyeball a schema.
const SAMPLE_ROWS: usize = 5;

/// Column names plus a few leading rows for one source file.
#[derive(Debug, Clone)]
pub struct FileProfile {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub samples: Vec<Vec<String>>,
}

/// Caller-owned index of the data directory, used by inspection tooling.
/// The aggregation path never consults it — every request re-reads its own
/// source file. Staleness is explicit: the catalog only changes when the
/// owner calls [`Catalog::refresh`].
#[derive(Debug)]
pub struct Catalog {
    data_dir: PathBuf,
    entries: BTreeMap<String, FileProfile>,
}

impl Catalog {
    /// Scan `data_dir` for `*.csv` files and profile each one. Unreadable
    /// files are skipped with a warning rather than failing the scan.
    pub fn scan(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut catalog = Catalog {
            data_dir: data_dir.into(),
            entries: BTreeMap::new(),
        };
        catalog.refresh()?;
        Ok(catalog)
    }

    /// Rebuild the index from the current directory contents.
    pub fn refresh(&mut self) -> Result<()> {
        let pattern = format!("{}/*.csv", self.data_dir.display());
        let mut entries = BTreeMap::new();

        for entry in glob(&pattern)? {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!("cannot read glob entry: {e}");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let name = match path.file_name().and_then(|f| f.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };

            match read_table(&path) {
                Ok(table) => {
                    let samples = table.rows.iter().take(SAMPLE_ROWS).cloned().collect();
                    entries.insert(
                        name,
                        FileProfile {
                            path: path.clone(),
                            columns: table.headers,
                            samples,
                        },
                    );
                }
                Err(e) => warn!(path = %path.display(), "skipping unreadable file: {e}"),
            }
        }

        debug!(files = entries.len(), dir = %self.data_dir.display(), "catalog scan");
        self.entries = entries;
        Ok(())
    }

    pub fn profile(&self, file_name: &str) -> Option<&FileProfile> {
        self.entries.get(file_name)
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &FileProfile)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
