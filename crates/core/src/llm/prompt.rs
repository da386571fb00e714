use crate::domain::config::GenerationConfig;
use crate::domain::forecast::ForecastDay;
use crate::domain::plan::date_key;
use crate::weather::icons::condition_label;

/// Renders the weekly request sent to the completion service.
///
/// Deterministic for a given forecast and config.
pub fn build_weekly_prompt(days: &[ForecastDay], config: &GenerationConfig) -> String {
    let mut rules = vec![
        format!("- Be suitable for a family of {}", config.num_portions),
        format!(
            "- Take less than {} minutes to prepare",
            config.max_prep_time_minutes
        ),
        "- Use common ingredients".to_string(),
    ];
    if !config.dietary_restrictions.is_empty() {
        rules.push(format!(
            "- Not contain: {}",
            config.dietary_restrictions.join(", ")
        ));
    }

    let weather_lines: Vec<String> = days
        .iter()
        .map(|day| {
            format!(
                "- {}: {}°C, {} (code {})",
                date_key(day.date),
                day.temperature_c,
                condition_label(day.condition_code),
                day.condition_code
            )
        })
        .collect();

    let schema = [
        "{",
        "  \"dinner_choices\": {",
        "    \"YYYY-MM-DD\": [",
        "      {",
        "        \"name\": \"Meal name\",",
        "        \"ingredients\": [\"ingredient 1\", \"ingredient 2\"],",
        "        \"prep_time\": \"Preparation time in minutes\",",
        "        \"instructions\": [\"Step 1\", \"Step 2\"]",
        "      }",
        "    ]",
        "  }",
        "}",
    ]
    .join("\n");

    format!(
        "Provide {suggestions} dinner main course suggestions per day for the following dates.\n\n\
Each meal must:\n{rules}\n\n\
Respond with only raw JSON: no prose, no markdown and no code blocks. Use this exact JSON format, keyed by date:\n{schema}\n\n\
Here is the weather forecast:\n{weather}\n\n\
Don't repeat meals across days.\n\n\
If you can't suggest meals for a date, use an empty array for that date.\n\n\
Translate your answer to {language}.",
        suggestions = config.num_suggestions_per_day,
        rules = rules.join("\n"),
        weather = weather_lines.join("\n"),
        language = config.output_language,
    )
}
