use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One day of the forecast, as shown next to that day's meals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Weekday name in the configured locale.
    pub label: String,
    pub temperature_c: i32,
    pub condition_code: i32,
    pub icon_id: String,
}
