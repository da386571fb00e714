use crate::domain::contract::LlmDinnerChoices;
use crate::domain::plan::DinnerChoices;
use crate::error::GenerationError;
use serde_json::Value;

const FENCE: &str = "```";

/// Removes a surrounding Markdown fence (```json ... ``` or ``` ... ```).
///
/// Text that does not start with a fence is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Optional language tag right after the opening fence.
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let inner = &rest[tag_len..];

    let inner = inner.trim_end();
    let inner = inner.strip_suffix(FENCE).unwrap_or(inner);
    inner.trim()
}

/// Parses the completion text into meals keyed by date.
///
/// A missing `dinner_choices` field means no suggestions. Text that is not
/// JSON, or a `dinner_choices` that is not a date -> list mapping, is a
/// `MalformedResponse` carrying the text. Unusable meals inside a day are
/// dropped on their own.
pub fn parse_dinner_choices(raw: &str) -> Result<DinnerChoices, GenerationError> {
    let json_str = strip_code_fence(raw);

    let parsed = serde_json::from_str::<Value>(json_str).map_err(|e| {
        GenerationError::malformed(format!("completion is not valid JSON: {e}"), json_str)
    })?;

    let choices = match parsed {
        Value::Object(mut obj) => obj.remove("dinner_choices").unwrap_or(Value::Null),
        _ => Value::Null,
    };
    if choices.is_null() {
        return Ok(DinnerChoices::new());
    }

    let choices = serde_json::from_value::<LlmDinnerChoices>(choices).map_err(|e| {
        GenerationError::malformed(
            format!("dinner_choices does not match the expected schema: {e}"),
            json_str,
        )
    })?;
    Ok(choices.into_choices())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn body() -> String {
        json!({
            "dinner_choices": {
                "2025-06-28": [{
                    "name": "Gazpacho",
                    "ingredients": ["tomatoes", "cucumber"],
                    "prep_time": 15,
                    "instructions": ["Blend", "Chill"]
                }],
                "2025-06-29": []
            }
        })
        .to_string()
    }

    #[test]
    fn strip_code_fence_handles_language_tag() {
        let inner = "{\"a\":1}";
        assert_eq!(strip_code_fence(&format!("```json\n{inner}\n```\n")), inner);
        assert_eq!(strip_code_fence(&format!("```JSON {inner}```")), inner);
        assert_eq!(strip_code_fence(&format!("```\n{inner}\n```")), inner);
        assert_eq!(strip_code_fence(&format!("  {inner}  ")), inner);
    }

    #[test]
    fn fenced_and_bare_parse_identically() {
        let bare = parse_dinner_choices(&body()).unwrap();
        let fenced = parse_dinner_choices(&format!("```json\n{}\n```", body())).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare["2025-06-28"][0].name, "Gazpacho");
        assert!(bare["2025-06-29"].is_empty());
    }

    #[test]
    fn missing_field_means_no_suggestions() {
        assert!(parse_dinner_choices("{\"other\": 1}").unwrap().is_empty());
        assert!(parse_dinner_choices("{\"dinner_choices\": null}").unwrap().is_empty());
        assert!(parse_dinner_choices("[1, 2, 3]").unwrap().is_empty());
    }

    #[test]
    fn rejects_prose() {
        let raw = "Sure! Here are some ideas for your week: pasta, soup and tacos.";
        let err = parse_dinner_choices(raw).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
        assert_eq!(err.raw_output.as_deref(), Some(raw));
    }

    #[test]
    fn rejects_truncated_json() {
        let raw = "```json\n{\"dinner_choices\": {\"2025-06-28\": [{\"name\": \"Chili\"";
        let err = parse_dinner_choices(raw).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }

    #[test]
    fn bad_meal_keeps_other_days() {
        let raw = json!({
            "dinner_choices": {
                "2025-06-28": [{ "name": "Soup", "ingredients": ["leeks"], "prep_time": 20, "instructions": ["Simmer"] }],
                "2025-06-29": ["Pasta"],
                "2025-06-30": [{ "name": 42 }]
            }
        })
        .to_string();

        let choices = parse_dinner_choices(&raw).unwrap();
        assert_eq!(choices["2025-06-28"][0].name, "Soup");
        assert!(choices["2025-06-29"].is_empty());
        assert!(choices["2025-06-30"].is_empty());
    }

    #[test]
    fn rejects_wrong_schema() {
        let err = parse_dinner_choices("{\"dinner_choices\": [\"pasta\"]}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }
}
