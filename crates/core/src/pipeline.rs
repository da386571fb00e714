use crate::config::Settings;
use crate::domain::config::WidgetConfig;
use crate::domain::forecast::ForecastDay;
use crate::domain::plan::{assemble_plan, DayPlan, DinnerChoices};
use crate::error::{ErrorKind, GenerationError};
use crate::llm::groq::GroqClient;
use crate::llm::json::parse_dinner_choices;
use crate::llm::prompt::build_weekly_prompt;
use crate::llm::CompletionClient;
use crate::weather::open_meteo::OpenMeteoClient;
use crate::weather::ForecastProvider;
use std::sync::Arc;
use uuid::Uuid;

/// Result of one forecast run.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    pub run_id: Uuid,
    pub plans: Vec<DayPlan>,
    /// The completion failed or could not be parsed; every day has an empty
    /// meal list.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct PromptPreview {
    pub days: Vec<ForecastDay>,
    pub prompt: String,
}

/// Weather -> prompt -> completion -> plan.
#[derive(Clone)]
pub struct Generator {
    forecast: Arc<dyn ForecastProvider>,
    completion: Arc<dyn CompletionClient>,
    default_api_key: Option<String>,
}

impl Generator {
    pub fn new(
        forecast: Arc<dyn ForecastProvider>,
        completion: Arc<dyn CompletionClient>,
        default_api_key: Option<String>,
    ) -> Self {
        Self {
            forecast,
            completion,
            default_api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(OpenMeteoClient::from_settings(settings)?),
            Arc::new(GroqClient::from_settings(settings)?),
            settings.groq_api_key.clone(),
        ))
    }

    pub async fn run(&self, config: &WidgetConfig) -> Result<GenerationRun, GenerationError> {
        let run_id = Uuid::new_v4();
        let preflight = config.preflight(self.default_api_key.as_deref())?;
        let generation = preflight.generation;

        tracing::info!(
            %run_id,
            days = generation.forecast_days,
            locale = %generation.locale,
            forecast = self.forecast.provider_name(),
            completion = ?self.completion.provider(),
            "starting forecast run"
        );

        let days = self
            .forecast
            .fetch_forecast(generation.coordinates, generation.forecast_days, &generation.locale)
            .await?;

        let prompt = build_weekly_prompt(&days, &generation);
        let parsed = match self.completion.complete(&prompt, &preflight.api_key).await {
            Ok(raw) => parse_dinner_choices(&raw),
            Err(err) => Err(err),
        };

        let (choices, degraded) = match parsed {
            Ok(choices) => (choices, false),
            Err(err) if err.kind == ErrorKind::MalformedResponse => {
                tracing::error!(
                    %run_id,
                    error = %err,
                    raw_output = err.raw_output.as_deref().unwrap_or_default(),
                    "failed to parse completion; delivering weather without meals"
                );
                (DinnerChoices::new(), true)
            }
            Err(err) if err.kind == ErrorKind::UpstreamUnavailable => {
                tracing::error!(
                    %run_id,
                    stage = err.stage,
                    error = %err,
                    "completion request failed; delivering weather without meals"
                );
                (DinnerChoices::new(), true)
            }
            Err(err) => return Err(err),
        };

        let plans = assemble_plan(&days, &choices);
        tracing::info!(
            %run_id,
            days = plans.len(),
            meals = plans.iter().map(|p| p.meals.len()).sum::<usize>(),
            degraded,
            "forecast run finished"
        );

        Ok(GenerationRun {
            run_id,
            plans,
            degraded,
        })
    }

    /// Fetches the forecast and renders the prompt without calling the
    /// completion service. Needs no credential.
    pub async fn preview_prompt(&self, config: &WidgetConfig) -> Result<PromptPreview, GenerationError> {
        let generation = config.generation_config()?;
        let days = self
            .forecast
            .fetch_forecast(generation.coordinates, generation.forecast_days, &generation.locale)
            .await?;
        let prompt = build_weekly_prompt(&days, &generation);
        Ok(PromptPreview { days, prompt })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::forecast::Coordinates;
    use crate::error::Upstream;
    use crate::llm::Provider;
    use crate::weather::icons::icon_for_code;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FakeForecast {
        pub days: Vec<(&'static str, i32, i32)>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ForecastProvider for FakeForecast {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_forecast(
            &self,
            _coordinates: Coordinates,
            days: u32,
            _locale: &str,
        ) -> Result<Vec<ForecastDay>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GenerationError::upstream(Upstream::Weather, "http", "connection refused"));
            }
            Ok(self
                .days
                .iter()
                .take(days as usize)
                .map(|(date, temp, code)| ForecastDay {
                    date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                    label: "day".to_string(),
                    temperature_c: *temp,
                    condition_code: *code,
                    icon_id: icon_for_code(*code).to_string(),
                })
                .collect())
        }
    }

    pub(crate) struct FakeCompletion {
        pub answer: Result<String, GenerationError>,
        pub calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CompletionClient for FakeCompletion {
        fn provider(&self) -> Provider {
            Provider::Groq
        }

        async fn complete(&self, _prompt: &str, _api_key: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    pub(crate) fn three_day_forecast() -> FakeForecast {
        FakeForecast {
            days: vec![("2025-06-28", 20, 0), ("2025-06-29", 18, 61), ("2025-06-30", 22, 95)],
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn answering(answer: &str) -> FakeCompletion {
        FakeCompletion {
            answer: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn widget_config() -> WidgetConfig {
        WidgetConfig {
            lat: Some(48.85),
            lon: Some(2.35),
            forecast_days: Some(3),
            ..WidgetConfig::default()
        }
        .with_defaults()
    }

    fn generator(forecast: FakeForecast, completion: FakeCompletion) -> (Generator, Arc<FakeForecast>, Arc<FakeCompletion>) {
        let forecast = Arc::new(forecast);
        let completion = Arc::new(completion);
        let generator = Generator::new(forecast.clone(), completion.clone(), Some("gsk_test".to_string()));
        (generator, forecast, completion)
    }

    #[tokio::test]
    async fn assembles_week_with_gaps() {
        let answer = format!(
            "```json\n{}\n```",
            json!({
                "dinner_choices": {
                    "2025-06-28": [{
                        "name": "Grilled chicken salad",
                        "ingredients": ["chicken", "lettuce"],
                        "prep_time": "25 minutes",
                        "instructions": ["Grill", "Toss"]
                    }],
                    "2025-06-30": [{
                        "name": "Tomato soup",
                        "ingredients": ["tomatoes"],
                        "prep_time": 20,
                        "instructions": ["Simmer"]
                    }]
                }
            })
        );
        let (generator, _, _) = generator(three_day_forecast(), answering(&answer));

        let run = generator.run(&widget_config()).await.unwrap();

        assert!(!run.degraded);
        assert_eq!(run.plans.len(), 3);
        assert_eq!(run.plans[0].meals[0].name, "Grilled chicken salad");
        assert!(run.plans[1].meals.is_empty());
        assert_eq!(run.plans[2].meals[0].name, "Tomato soup");
        let icons: Vec<_> = run.plans.iter().map(|p| p.forecast.icon_id.as_str()).collect();
        assert_eq!(icons, ["wi-day-sunny", "wi-raindrops", "wi-thunderstorm"]);
    }

    #[tokio::test]
    async fn malformed_completion_keeps_weather() {
        let (generator, _, _) = generator(three_day_forecast(), answering("I cannot help with that."));

        let run = generator.run(&widget_config()).await.unwrap();

        assert!(run.degraded);
        assert_eq!(run.plans.len(), 3);
        assert!(run.plans.iter().all(|p| p.meals.is_empty()));
        assert_eq!(run.plans[1].forecast.temperature_c, 18);
    }

    #[tokio::test]
    async fn preflight_failure_makes_no_calls() {
        let (generator, forecast, completion) = generator(three_day_forecast(), answering("{}"));
        let config = WidgetConfig {
            lat: None,
            ..widget_config()
        };

        let err = generator.run(&config).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::MissingLocation);
        assert_eq!(forecast.calls.load(Ordering::SeqCst), 0);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credential_without_fallback() {
        let generator = Generator::new(
            Arc::new(three_day_forecast()),
            Arc::new(answering("{}")),
            None,
        );
        let err = generator.run(&widget_config()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn weather_failure_aborts_run() {
        let failing = FakeForecast {
            fail: true,
            ..three_day_forecast()
        };
        let (generator, _, completion) = generator(failing, answering("{}"));

        let err = generator.run(&widget_config()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn completion_failure_keeps_weather() {
        let completion = FakeCompletion {
            answer: Err(GenerationError::upstream(Upstream::Completion, "http", "status=503")),
            calls: AtomicUsize::new(0),
        };
        let (generator, _, _) = generator(three_day_forecast(), completion);

        let run = generator.run(&widget_config()).await.unwrap();

        assert!(run.degraded);
        assert_eq!(run.plans.len(), 3);
        assert!(run.plans.iter().all(|p| p.meals.is_empty()));
        assert_eq!(run.plans[2].forecast.icon_id, "wi-thunderstorm");
    }

    #[tokio::test]
    async fn rejected_credential_aborts_run() {
        let completion = FakeCompletion {
            answer: Err(GenerationError::missing_credential()),
            calls: AtomicUsize::new(0),
        };
        let (generator, _, _) = generator(three_day_forecast(), completion);

        let err = generator.run(&widget_config()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn preview_skips_completion() {
        let generator = Generator::new(Arc::new(three_day_forecast()), Arc::new(answering("{}")), None);

        let preview = generator.preview_prompt(&widget_config()).await.unwrap();

        assert_eq!(preview.days.len(), 3);
        assert!(preview.prompt.contains("- 2025-06-29: 18°C"));
    }
}
