use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

static CJK_YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})年(\d{1,2})月").unwrap());
static CJK_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})年").unwrap());
static SEP_YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})").unwrap());
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Normalize a free-text period into the canonical `YYYY-MM` form.
///
/// Rules are tried in order, first match wins:
/// 1. `"2023年3月"` → `"2023-03"`
/// 2. `"2023年"` → `"2023-12"` (year-only rows mean the December report)
/// 3. `"2023-3"` / `"2023/03/15 10:00"` → `"2023-03"` (trailing day/time ignored)
/// 4. `"2023"` → `"2023-12"`
/// 5. anything else is returned unchanged; callers treat a non-canonical
///    result as unparseable and drop the row.
pub fn canonical_month(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return raw.to_string();
    }

    if let Some(caps) = CJK_YEAR_MONTH.captures(text) {
        if let Ok(month) = caps[2].parse::<u32>() {
            return format!("{}-{:02}", &caps[1], month);
        }
    }
    if let Some(caps) = CJK_YEAR.captures(text) {
        return format!("{}-12", &caps[1]);
    }
    if let Some(caps) = SEP_YEAR_MONTH.captures(text) {
        if let Ok(month) = caps[2].parse::<u32>() {
            return format!("{}-{:02}", &caps[1], month);
        }
    }
    if BARE_YEAR.is_match(text) {
        return format!("{}-12", text);
    }

    raw.to_string()
}

/// Canonical monthly period key. Ordering on `(year, month)` matches the
/// lexicographic ordering of the zero-padded `YYYY-MM` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(MonthKey { year, month })
        } else {
            None
        }
    }

    /// Parse a free-text period via [`canonical_month`]. `None` means the
    /// row carries no usable month and should be discarded.
    pub fn from_raw(raw: &str) -> Option<Self> {
        canonical_month(raw).parse().ok()
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The next calendar month; December wraps into January of year + 1.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            MonthKey {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Short chart label, `"3月"` style.
    pub fn short_label(self) -> String {
        format!("{}月", self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ();

    /// Strict `YYYY-MM` only; use [`MonthKey::from_raw`] for free text.
    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        let (y, m) = s.split_once('-').ok_or(())?;
        if y.len() != 4 || m.len() != 2 {
            return Err(());
        }
        let year = y.parse().map_err(|_| ())?;
        let month = m.parse().map_err(|_| ())?;
        MonthKey::new(year, month).ok_or(())
    }
}

/// The current local month, used as the forecast anchor of last resort.
pub fn current_month() -> MonthKey {
    let now = chrono::Local::now();
    MonthKey {
        year: now.year(),
        month: now.month(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_year_month() {
        assert_eq!(canonical_month("2023年3月"), "2023-03");
        assert_eq!(canonical_month("2023年11月"), "2023-11");
        assert_eq!(canonical_month("  2023年3月  "), "2023-03");
    }

    #[test]
    fn cjk_year_defaults_to_december() {
        assert_eq!(canonical_month("2023年"), "2023-12");
    }

    #[test]
    fn separator_forms() {
        assert_eq!(canonical_month("2023-3"), "2023-03");
        assert_eq!(canonical_month("2023/03"), "2023-03");
        assert_eq!(canonical_month("2023/03/15 10:30:00"), "2023-03");
    }

    #[test]
    fn bare_year_defaults_to_december() {
        assert_eq!(canonical_month("2023"), "2023-12");
    }

    #[test]
    fn unmatched_text_passes_through() {
        assert_eq!(canonical_month("last march"), "last march");
        assert_eq!(canonical_month(""), "");
    }

    #[test]
    fn idempotent_on_canonical_input() {
        for raw in ["2023年3月", "2023-07", "2024"] {
            let once = canonical_month(raw);
            assert_eq!(canonical_month(&once), once);
        }
    }

    #[test]
    fn key_parsing_and_order() {
        let march: MonthKey = "2023-03".parse().unwrap();
        assert_eq!(march.year(), 2023);
        assert_eq!(march.month(), 3);
        assert_eq!(march.to_string(), "2023-03");
        assert_eq!(march.short_label(), "3月");

        let nov: MonthKey = "2023-11".parse().unwrap();
        assert!(march < nov);
        // typed ordering matches the lexicographic string ordering
        assert_eq!(march < nov, march.to_string() < nov.to_string());

        assert!("2023-13".parse::<MonthKey>().is_err());
        assert!("2023-3".parse::<MonthKey>().is_err());
    }

    #[test]
    fn succ_wraps_december() {
        let dec = MonthKey::new(2023, 12).unwrap();
        assert_eq!(dec.succ().to_string(), "2024-01");
        assert_eq!(MonthKey::new(2023, 5).unwrap().succ().to_string(), "2023-06");
    }

    #[test]
    fn from_raw_rejects_junk_months() {
        assert!(MonthKey::from_raw("2023年3月").is_some());
        assert!(MonthKey::from_raw("2023年13月").is_none());
        assert!(MonthKey::from_raw("station A").is_none());
    }
}
