use once_cell::sync::Lazy;
use regex::Regex;

use crate::timekey::MonthKey;

static TOKEN_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

/// Closed set of sub-period shapes a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpan {
    FullYear,
    SecondHalf,
    FourthQuarter,
}

impl RangeSpan {
    fn first_month(self) -> u32 {
        match self {
            RangeSpan::FullYear => 1,
            RangeSpan::SecondHalf => 7,
            RangeSpan::FourthQuarter => 10,
        }
    }
}

/// A requested sub-period: the span shape plus an optional explicit year.
/// With no explicit year, the year of the first available key applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub span: RangeSpan,
    pub year: Option<i32>,
}

impl TimeRange {
    pub fn full_year() -> Self {
        TimeRange {
            span: RangeSpan::FullYear,
            year: None,
        }
    }

    /// Parse a request token such as `"2023年下半年"`, `"fourth-quarter"`,
    /// or `"full-year 2024"`. Unrecognized shapes default to the full year.
    pub fn parse(token: &str) -> Self {
        let lowered = token.trim().to_lowercase();
        let year = TOKEN_YEAR
            .captures(&lowered)
            .and_then(|c| c[1].parse().ok());

        let span = if lowered.contains("下半年") || lowered.contains("half") {
            RangeSpan::SecondHalf
        } else if lowered.contains("季度") || lowered.contains("quarter") || lowered.contains("q4")
        {
            RangeSpan::FourthQuarter
        } else {
            RangeSpan::FullYear
        };

        TimeRange { span, year }
    }

    /// Keep the keys of the applicable year whose month falls inside the
    /// span. Order is preserved; nothing is deduplicated.
    pub fn filter(&self, keys: &[MonthKey]) -> Vec<MonthKey> {
        let year = match self.year.or_else(|| keys.first().map(|k| k.year())) {
            Some(y) => y,
            None => return Vec::new(),
        };
        keys.iter()
            .filter(|k| k.year() == year && k.month() >= self.span.first_month())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_2023() -> Vec<MonthKey> {
        (1..=12).map(|m| MonthKey::new(2023, m).unwrap()).collect()
    }

    #[test]
    fn parse_tokens() {
        assert_eq!(
            TimeRange::parse("2023年下半年"),
            TimeRange {
                span: RangeSpan::SecondHalf,
                year: Some(2023)
            }
        );
        assert_eq!(
            TimeRange::parse("fourth-quarter"),
            TimeRange {
                span: RangeSpan::FourthQuarter,
                year: None
            }
        );
        assert_eq!(
            TimeRange::parse("full-year 2024"),
            TimeRange {
                span: RangeSpan::FullYear,
                year: Some(2024)
            }
        );
        assert_eq!(TimeRange::parse("anything"), TimeRange::full_year());
    }

    #[test]
    fn spans_select_months() {
        let keys = year_2023();
        assert_eq!(TimeRange::parse("全年").filter(&keys).len(), 12);
        let half = TimeRange::parse("下半年").filter(&keys);
        assert_eq!(half.len(), 6);
        assert_eq!(half[0].month(), 7);
        let quarter = TimeRange::parse("第四季度").filter(&keys);
        assert_eq!(quarter.len(), 3);
        assert_eq!(quarter[0].month(), 10);
    }

    #[test]
    fn explicit_year_beats_inference() {
        let mut keys = year_2023();
        keys.extend((1..=3).map(|m| MonthKey::new(2024, m).unwrap()));
        let filtered = TimeRange::parse("2024年全年").filter(&keys);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|k| k.year() == 2024));
    }

    #[test]
    fn filtering_composes() {
        let keys = year_2023();
        let full = TimeRange::parse("2023年全年").filter(&keys);
        let via_full = TimeRange::parse("第四季度").filter(&full);
        let direct = TimeRange::parse("2023年第四季度").filter(&keys);
        assert_eq!(via_full, direct);
    }

    #[test]
    fn empty_series_filters_to_empty() {
        assert!(TimeRange::full_year().filter(&[]).is_empty());
    }

    #[test]
    fn order_is_preserved_without_dedup() {
        let jan = MonthKey::new(2023, 1).unwrap();
        let feb = MonthKey::new(2023, 2).unwrap();
        let keys = vec![feb, jan, feb];
        assert_eq!(TimeRange::full_year().filter(&keys), vec![feb, jan, feb]);
    }
}
