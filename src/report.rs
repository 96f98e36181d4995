use std::collections::BTreeMap;

use serde::Serialize;

/// One chart line: metric name plus values aligned with the label axis.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub name: String,
    pub data: Vec<f64>,
}

/// Summary statistics block, serialized for the routing layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewBlock {
    pub record_count: usize,
    pub station_count: usize,
    pub time_span: String,
    pub quality: String,
    pub averages: BTreeMap<String, f64>,
}

/// Aggregated monthly view of one source: chart axes, summary, and a
/// render-ready table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub overview: OverviewBlock,
    pub table_header: Vec<String>,
    pub table_data: Vec<Vec<String>>,
}

/// Future block of a forecast response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBlock {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Historical series plus its projection and a one-sentence trend
/// description. Historical labels are canonical `YYYY-MM` keys so the
/// prediction labels visibly continue the sequence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub predictions: PredictionBlock,
    pub trend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_with_camel_case_keys() {
        let report = SummaryReport {
            labels: vec!["1月".into()],
            datasets: vec![Dataset {
                name: "PM2.5".into(),
                data: vec![42.0],
            }],
            overview: OverviewBlock {
                record_count: 1,
                station_count: 1,
                time_span: "2023-01 ~ 2023-01".into(),
                quality: "good".into(),
                averages: BTreeMap::new(),
            },
            table_header: vec!["月份".into()],
            table_data: vec![vec!["1月".into()]],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("tableHeader").is_some());
        assert!(json.get("tableData").is_some());
        assert_eq!(json["overview"]["recordCount"], 1);
    }
}
