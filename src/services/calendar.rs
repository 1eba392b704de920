//! Period labels and year-range windows for time-based charts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Granularity of the price trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    #[default]
    Yearly,
    Monthly,
}

/// Year window applied to the market volume series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearRange {
    #[default]
    All,
    Last10,
    Last20,
    Last30,
    Since2000,
    Since2010,
}

impl YearRange {
    /// First year included, given the last complete calendar year.
    pub fn start_year(self, last_complete: i32) -> Option<i32> {
        match self {
            Self::All => None,
            Self::Last10 => Some(last_complete - 9),
            Self::Last20 => Some(last_complete - 19),
            Self::Last30 => Some(last_complete - 29),
            Self::Since2000 => Some(2000),
            Self::Since2010 => Some(2010),
        }
    }

    /// Whether `year` falls inside the window. The current, incomplete year never does.
    pub fn contains(self, year: i32, current_year: i32) -> bool {
        let last_complete = current_year - 1;
        if year > last_complete {
            return false;
        }
        self.start_year(last_complete).map_or(true, |start| year >= start)
    }
}

/// Label such as `"Mar 2021"`; `None` for a month outside 1..=12.
pub fn month_label(year: i32, month: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%b %Y").to_string())
}
