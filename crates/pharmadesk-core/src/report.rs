//! # Stock Reports
//!
//! Classification and statistics for the stock report screen.
//!
//! ## Thresholds
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────┐
//! │ Low stock            │ Tablets < 100, any other type < 10       │
//! │ Near expiry          │ closest expiry less than 30 days away    │
//! │                      │ (already expired counts as near)         │
//! └──────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! ## Expiry Text
//! Deliveries record expiry as `YYYY-MM-DD` or just `YYYY-MM`. A month-only
//! expiry is read as the 30th, clamped to the last day of short months.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Medicine;

pub const LOW_STOCK_TABLETS: i64 = 100;
pub const LOW_STOCK_OTHER: i64 = 10;
pub const NEAR_EXPIRY_DAYS: i64 = 30;

const TABLETS: &str = "Tablets";

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Low,
    Ok,
}

/// Low/Ok for a medicine of `medicine_type` holding `current_stock` units.
pub fn stock_level(medicine_type: &str, current_stock: i64) -> StockLevel {
    let threshold = if medicine_type.trim().eq_ignore_ascii_case(TABLETS) {
        LOW_STOCK_TABLETS
    } else {
        LOW_STOCK_OTHER
    };
    if current_stock < threshold {
        StockLevel::Low
    } else {
        StockLevel::Ok
    }
}

/// Parses delivery expiry text. Returns `None` for anything unreadable.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pharmadesk_core::report::parse_expiry;
///
/// assert_eq!(parse_expiry("2025-03"), NaiveDate::from_ymd_opt(2025, 3, 30));
/// assert_eq!(parse_expiry("2025-02"), NaiveDate::from_ymd_opt(2025, 2, 28));
/// assert_eq!(parse_expiry("2025-02-10"), NaiveDate::from_ymd_opt(2025, 2, 10));
/// ```
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let (year, month) = raw.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let day = 30.min(days_in_month(first));
    first.with_day(day)
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map(|n| (n - first).num_days() as u32).unwrap_or(28)
}

/// Earliest readable expiry among `raw`.
pub fn closest_expiry<'a, I>(raw: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().filter_map(parse_expiry).min()
}

/// Whole days from `today` to `expiry`. Negative once expired.
pub fn days_to_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

// =============================================================================
// Report Rows
// =============================================================================

/// One line of the stock report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockRow {
    pub name: String,
    pub current_stock: i64,
    pub medicine_type: String,
    pub company: Option<String>,
    #[ts(as = "Option<String>")]
    pub last_delivery_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub closest_expiry: Option<NaiveDate>,
    pub days_to_expiry: Option<i64>,
    pub level: StockLevel,
    pub near_expiry: bool,
}

impl StockRow {
    /// Builds a row from a medicine and the expiry texts of its deliveries.
    pub fn build<'a, I>(medicine: &Medicine, expiries: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let closest = closest_expiry(expiries);
        let days = closest.map(|e| days_to_expiry(e, today));
        StockRow {
            name: medicine.name.clone(),
            current_stock: medicine.current_stock,
            medicine_type: medicine.medicine_type.clone(),
            company: medicine.company.clone(),
            last_delivery_date: medicine.last_delivery_date,
            closest_expiry: closest,
            days_to_expiry: days,
            level: stock_level(&medicine.medicine_type, medicine.current_stock),
            near_expiry: days.map_or(false, |d| d < NEAR_EXPIRY_DAYS),
        }
    }
}

/// Summary counters over the filtered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockStatistics {
    pub total_medicines: i64,
    pub low_stock_count: i64,
    pub near_expiry_count: i64,
}

impl StockStatistics {
    pub fn from_rows(rows: &[StockRow]) -> Self {
        StockStatistics {
            total_medicines: rows.len() as i64,
            low_stock_count: rows.iter().filter(|r| r.level == StockLevel::Low).count() as i64,
            near_expiry_count: rows.iter().filter(|r| r.near_expiry).count() as i64,
        }
    }
}

/// Optional filters of the stock report. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockFilter {
    #[serde(default)]
    pub medicine: Option<String>,
    #[serde(default)]
    pub medicine_type: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl StockFilter {
    /// Drops blank values.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        StockFilter {
            medicine: clean(self.medicine),
            medicine_type: clean(self.medicine_type),
            company: clean(self.company),
        }
    }
}

/// Rows plus their statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockReport {
    pub rows: Vec<StockRow>,
    pub statistics: StockStatistics,
}

impl StockReport {
    pub fn new(rows: Vec<StockRow>) -> Self {
        let statistics = StockStatistics::from_rows(&rows);
        StockReport { rows, statistics }
    }
}

/// Values offered in the report's filter drop-downs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockFilterOptions {
    pub names: Vec<String>,
    pub types: Vec<String>,
    pub companies: Vec<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn medicine(kind: &str, stock: i64) -> Medicine {
        Medicine {
            id: 1,
            name: "Paracetamol".into(),
            mrp_paise: 1000,
            ptr_paise: 800,
            company: Some("Cipla".into()),
            medicine_type: kind.into(),
            current_stock: stock,
            last_delivery_date: None,
        }
    }

    #[test]
    fn test_stock_level_thresholds() {
        assert_eq!(stock_level("Tablets", 99), StockLevel::Low);
        assert_eq!(stock_level("Tablets", 100), StockLevel::Ok);
        assert_eq!(stock_level("Syrup", 9), StockLevel::Low);
        assert_eq!(stock_level("Syrup", 10), StockLevel::Ok);
        assert_eq!(stock_level("tablets", 50), StockLevel::Low);
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("2024-12"), Some(date(2024, 12, 30)));
        assert_eq!(parse_expiry("2024-02"), Some(date(2024, 2, 29)));
        assert_eq!(parse_expiry("2024-13"), None);
        assert_eq!(parse_expiry("No info"), None);
        assert_eq!(parse_expiry(""), None);
    }

    #[test]
    fn test_closest_expiry_mixed_formats() {
        // Month-only "2025-03" is the 30th, so the 15th is closer
        let closest = closest_expiry(["2025-03", "2025-03-15", "bad", "2026-01"]);
        assert_eq!(closest, Some(date(2025, 3, 15)));
        assert_eq!(closest_expiry(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_row_near_expiry() {
        let today = date(2025, 3, 1);
        let row = StockRow::build(&medicine("Tablets", 500), ["2025-03"], today);
        assert_eq!(row.days_to_expiry, Some(29));
        assert!(row.near_expiry);
        assert_eq!(row.level, StockLevel::Ok);

        let row = StockRow::build(&medicine("Tablets", 500), ["2025-04-01"], today);
        assert!(!row.near_expiry);

        let row = StockRow::build(&medicine("Syrup", 2), std::iter::empty(), today);
        assert_eq!(row.days_to_expiry, None);
        assert!(!row.near_expiry);
        assert_eq!(row.level, StockLevel::Low);
    }

    #[test]
    fn test_statistics() {
        let today = date(2025, 3, 1);
        let report = StockReport::new(vec![
            StockRow::build(&medicine("Tablets", 50), ["2025-03-10"], today),
            StockRow::build(&medicine("Tablets", 500), ["2026-01"], today),
            StockRow::build(&medicine("Syrup", 5), ["2024-12"], today),
        ]);
        assert_eq!(
            report.statistics,
            StockStatistics {
                total_medicines: 3,
                low_stock_count: 2,
                near_expiry_count: 2,
            }
        );
    }

    #[test]
    fn test_filter_normalized() {
        let filter = StockFilter {
            medicine: Some("  ".into()),
            medicine_type: Some(" Syrup ".into()),
            company: None,
        }
        .normalized();
        assert_eq!(filter.medicine, None);
        assert_eq!(filter.medicine_type.as_deref(), Some("Syrup"));
    }
}
