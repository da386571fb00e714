use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// One dinner suggestion for a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSuggestion {
    pub name: String,
    pub ingredients: Vec<String>,
    pub prep_time: Option<PrepTime>,
    pub instructions: Vec<String>,
}

/// Preparation time as the model reported it.
///
/// The model is asked for minutes but answers with numbers, strings such as
/// "25 minutes", or free text. Anything readable as a duration becomes
/// `Minutes`; the rest is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrepTime {
    Minutes(u32),
    Text(String),
}

impl PrepTime {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                let minutes = n.as_f64().filter(|m| m.is_finite() && *m >= 0.0)?;
                Some(Self::Minutes(minutes.round() as u32))
            }
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                Some(match parse_minutes(s) {
                    Some(minutes) => Self::Minutes(minutes),
                    None => Self::Text(s.to_string()),
                })
            }
            _ => None,
        }
    }
}

static DURATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: 25 min, 1h30, 1 1/2 hours, 1,5 heures, 20-30 minutes, 15 to 20 min
    Regex::new(
        r"(?P<low>\d+\s+\d+/\d+|\d+/\d+|\d+(?:[.,]\d+)?)(?:\s*(?:-|–|\bto\b)\s*(?P<high>\d+\s+\d+/\d+|\d+/\d+|\d+(?:[.,]\d+)?))?\s*(?P<unit>\p{L}+)?",
    )
    .ok()
});

/// Reads a duration such as "1 hour 15 min", "1h30", "1 1/2 hours" or
/// "20-30 minutes".
///
/// Units starting with `h` count as hours, units starting with `m` as
/// minutes. A range resolves to its upper bound. A bare number right after
/// an hour amount is minutes; other bare numbers only count when the text
/// holds nothing else.
pub fn parse_minutes(text: &str) -> Option<u32> {
    let pattern = DURATION_PATTERN.as_ref()?;
    let text = text.to_lowercase();

    let mut total = 0.0_f64;
    let mut timed = false;
    let mut bare = Vec::new();
    let mut hours_end: Option<usize> = None;

    for caps in pattern.captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let low = caps.name("low").and_then(|m| quantity(m.as_str()));
        let high = caps.name("high").and_then(|m| quantity(m.as_str()));
        let value = match (low, high) {
            (Some(low), Some(high)) => low.max(high),
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => continue,
        };
        let follows_hours = hours_end
            .take()
            .is_some_and(|end| text[end..whole.start()].trim().is_empty());

        match caps.name("unit").map(|m| m.as_str()) {
            Some(unit) if unit.starts_with('h') => {
                total += value * 60.0;
                timed = true;
                hours_end = Some(whole.end());
            }
            Some(unit) if unit.starts_with('m') => {
                total += value;
                timed = true;
            }
            Some(_) => {}
            None if follows_hours => total += value,
            None => bare.push(value),
        }
    }

    let minutes = match (timed, bare.as_slice()) {
        (true, _) => total,
        (false, [only]) => *only,
        _ => return None,
    };
    minutes.is_finite().then(|| minutes.round() as u32)
}

// "30", "1,5", "1/2" or "1 1/2".
fn quantity(text: &str) -> Option<f64> {
    let Some((head, den)) = text.split_once('/') else {
        return text.replace(',', ".").parse::<f64>().ok();
    };
    let den = den.trim().parse::<f64>().ok().filter(|d| *d > 0.0)?;
    let parts: Vec<&str> = head.split_whitespace().collect();
    let (whole, num) = match parts.as_slice() {
        [num] => (0.0, *num),
        [whole, num] => (whole.parse::<f64>().ok()?, *num),
        _ => return None,
    };
    Some(whole + num.parse::<f64>().ok()? / den)
}
