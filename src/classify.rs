use tracing::debug;

/// Column roles discovered from a header row.
///
/// `time` and `region` stay `None` when nothing matches; consumers decide
/// whether that is fatal. Indices point into the header/row cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub time: Option<usize>,
    pub region: Option<usize>,
    pub label: Option<usize>,
    pub grade: Option<usize>,
    pub metrics: Vec<usize>,
}

/// Keyword-driven header classifier. Source schemas vary per file, so the
/// roles are guessed from column names rather than fixed positions. The
/// keyword sets are plain data: swap them to change the heuristic without
/// touching aggregation.
#[derive(Debug, Clone)]
pub struct Classifier {
    pub time_keywords: Vec<String>,
    pub region_keywords: Vec<String>,
    pub label_keywords: Vec<String>,
    pub grade_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier {
            time_keywords: keywords(&["时间", "日期", "月份", "年月", "time", "date", "month"]),
            region_keywords: keywords(&[
                "站点", "城市", "区域", "断面", "点位", "site", "station", "city", "region",
            ]),
            label_keywords: keywords(&[
                "指标", "项目", "监测项目", "item", "indicator", "parameter",
            ]),
            grade_keywords: keywords(&["类别", "水质", "等级", "grade", "class", "level"]),
            exclude_keywords: keywords(&["名称", "编号", "备注", "name", "id", "remark"]),
        }
    }
}

impl Classifier {
    pub fn classify(&self, headers: &[String]) -> ColumnRoles {
        let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let find = |words: &[String]| {
            lowered
                .iter()
                .position(|name| words.iter().any(|w| name.contains(w.as_str())))
        };

        let time = find(&self.time_keywords);
        let region = find(&self.region_keywords);
        let label = find(&self.label_keywords);
        let grade = find(&self.grade_keywords);

        // Everything that matches no descriptive keyword is assumed numeric.
        let metrics = lowered
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                !self
                    .time_keywords
                    .iter()
                    .chain(&self.region_keywords)
                    .chain(&self.label_keywords)
                    .chain(&self.grade_keywords)
                    .chain(&self.exclude_keywords)
                    .any(|w| name.contains(w.as_str()))
            })
            .map(|(idx, _)| idx)
            .collect();

        let roles = ColumnRoles {
            time,
            region,
            label,
            grade,
            metrics,
        };
        debug!(?roles, ?headers, "classified header");
        roles
    }
}
