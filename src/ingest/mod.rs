pub mod catalog;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{PipelineError, Result};

/// One source table: the header row plus every data row, all as raw text.
/// Read once per request and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trim whitespace + strip outer quotes if present.
pub fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read a delimited text file into a [`Table`].
///
/// Tolerates a leading UTF-8 BOM, invalid UTF-8 (replaced lossily), and
/// rows whose field count differs from the header. A missing file maps to
/// [`PipelineError::NotFound`]; schema validation is the pipeline's job.
pub fn read_table(path: &Path) -> Result<Table> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            PipelineError::NotFound(path.to_path_buf())
        } else {
            PipelineError::Io(e)
        }
    })?;

    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(clean_cell).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(clean_cell).collect());
    }

    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "read table"
    );
    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_table(content: &[u8]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content).unwrap();
        tmp
    }

    #[test]
    fn reads_header_and_rows() {
        let tmp = write_table("时间,站点,PM2.5\n2023年1月,城东,42\n2023年2月,城西,38\n".as_bytes());
        let table = read_table(tmp.path()).unwrap();
        assert_eq!(table.headers, vec!["时间", "站点", "PM2.5"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["2023年1月", "城东", "42"]);
    }

    #[test]
    fn strips_leading_bom() {
        let mut content = vec![0xEF, 0xBB, 0xBF];
        content.extend_from_slice(b"date,site,value\n2023-01,east,5\n");
        let tmp = write_table(&content);
        let table = read_table(tmp.path()).unwrap();
        assert_eq!(table.headers[0], "date");
    }

    #[test]
    fn tolerates_ragged_rows() {
        let tmp = write_table(b"date,site,value\n2023-01,east\n2023-02,west,7,extra\n");
        let table = read_table(tmp.path()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_table(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn clean_cell_strips_quotes() {
        assert_eq!(clean_cell("  \"城东\"  "), "城东");
        assert_eq!(clean_cell(" plain "), "plain");
    }
}
