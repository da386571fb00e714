use crate::domain::forecast::ForecastDay;
use crate::domain::meal::MealSuggestion;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Parsed model output: ISO date string -> meals for that date.
pub type DinnerChoices = BTreeMap<String, Vec<MealSuggestion>>;

/// One row of the widget: a forecast day and its meals.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub forecast: ForecastDay,
    pub meals: Vec<MealSuggestion>,
}

/// Joins forecast days with the model's meals by date.
///
/// Always returns one entry per forecast day, in forecast order. A date the
/// model skipped gets an empty meal list.
pub fn assemble_plan(days: &[ForecastDay], choices: &DinnerChoices) -> Vec<DayPlan> {
    days.iter()
        .map(|day| DayPlan {
            forecast: day.clone(),
            meals: choices.get(&date_key(day.date)).cloned().unwrap_or_default(),
        })
        .collect()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Serialize)]
struct DayPlanView<'a> {
    day: &'a str,
    date: NaiveDate,
    temp: i32,
    code: i32,
    icon: &'a str,
    meals: &'a [MealSuggestion],
}

// The display layer reads the flat row shape.
impl Serialize for DayPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DayPlanView {
            day: &self.forecast.label,
            date: self.forecast.date,
            temp: self.forecast.temperature_c,
            code: self.forecast.condition_code,
            icon: &self.forecast.icon_id,
            meals: &self.meals,
        }
        .serialize(serializer)
    }
}
