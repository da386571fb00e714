use crate::domain::meal::{MealSuggestion, PrepTime};
use crate::domain::plan::DinnerChoices;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `dinner_choices` as the model writes it, before normalization.
///
/// Days are checked as a date -> list mapping; meals inside a day are
/// checked one by one so a single bad element only costs that element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmDinnerChoices(pub BTreeMap<String, Option<Vec<Value>>>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMeal {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub prep_time: Option<Value>,
    #[serde(default, deserialize_with = "string_list")]
    pub instructions: Vec<String>,
}

impl LlmDinnerChoices {
    pub fn into_choices(self) -> DinnerChoices {
        let mut out = DinnerChoices::new();
        for (date, meals) in self.0 {
            let date = date.trim().to_string();
            let meals: Vec<MealSuggestion> = meals
                .unwrap_or_default()
                .into_iter()
                .filter_map(|value| LlmMeal::from_value(&date, value))
                .filter_map(LlmMeal::into_meal)
                .collect();
            out.entry(date).or_default().extend(meals);
        }
        out
    }
}

impl LlmMeal {
    fn from_value(date: &str, value: Value) -> Option<Self> {
        if !value.is_object() {
            tracing::warn!(date, element = %value, "dropping meal suggestion that is not an object");
            return None;
        }
        match serde_json::from_value::<Self>(value) {
            Ok(meal) => Some(meal),
            Err(e) => {
                tracing::warn!(date, error = %e, "dropping malformed meal suggestion");
                None
            }
        }
    }

    /// Normalizes one meal; a meal without a name is dropped.
    fn into_meal(self) -> Option<MealSuggestion> {
        let name = self.name.map(|s| s.trim().to_string()).unwrap_or_default();
        if name.is_empty() {
            tracing::warn!("dropping meal suggestion without a name");
            return None;
        }

        Some(MealSuggestion {
            name,
            ingredients: self.ingredients,
            prep_time: self.prep_time.as_ref().and_then(PrepTime::from_json),
            instructions: self.instructions,
        })
    }
}

// Accepts a list of strings, a single string, or null.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other @ Value::String(_) => vec![other],
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a list of strings, got {other}"
            )))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_loose_meals() {
        let raw: LlmDinnerChoices = serde_json::from_value(json!({
            " 2025-06-28 ": [
                {
                    "name": "  Shakshuka ",
                    "ingredients": ["eggs", " tomatoes ", ""],
                    "prep_time": "25 minutes",
                    "instructions": "Simmer everything"
                },
                { "name": "", "ingredients": [] }
            ],
            "2025-06-29": null
        }))
        .unwrap();

        let choices = raw.into_choices();
        let meals = &choices["2025-06-28"];
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].name, "Shakshuka");
        assert_eq!(meals[0].ingredients, vec!["eggs", "tomatoes"]);
        assert_eq!(meals[0].prep_time, Some(PrepTime::Minutes(25)));
        assert_eq!(meals[0].instructions, vec!["Simmer everything"]);
        assert!(choices["2025-06-29"].is_empty());
    }

    #[test]
    fn bad_elements_only_cost_themselves() {
        let raw: LlmDinnerChoices = serde_json::from_value(json!({
            "2025-06-28": [{ "name": "Soup", "ingredients": ["leeks"], "prep_time": 20 }],
            "2025-06-29": [
                "Pasta",
                { "name": 42 },
                { "name": "Stew", "ingredients": { "a": 1 } },
                { "name": "Tacos", "ingredients": "tortillas" }
            ]
        }))
        .unwrap();

        let choices = raw.into_choices();
        assert_eq!(choices["2025-06-28"][0].name, "Soup");
        let names: Vec<_> = choices["2025-06-29"].iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Tacos"]);
    }

    #[test]
    fn day_must_be_a_list() {
        let res = serde_json::from_value::<LlmDinnerChoices>(json!({
            "2025-06-28": { "name": "Soup" }
        }));
        assert!(res.is_err());
    }
}
