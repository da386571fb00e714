use crate::config::Settings;
use crate::domain::forecast::{Coordinates, ForecastDay};
use crate::error::{GenerationError, Upstream};
use crate::weather::icons::icon_for_code;
use crate::weather::ForecastProvider;
use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";
const DAILY_FIELDS: &str = "temperature_2m_max,weathercode";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings
            .weather_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("WEATHER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build weather http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), FORECAST_PATH)
    }

    async fn fetch_daily(&self, coordinates: Coordinates) -> Result<ForecastResponse, GenerationError> {
        let upstream = |stage, detail: String| GenerationError::upstream(Upstream::Weather, stage, detail);

        let res = self
            .http
            .get(self.url())
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| upstream("http", format!("forecast request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| upstream("http", format!("failed to read forecast response: {e}")))?;
        if !status.is_success() {
            return Err(upstream("http", format!("forecast HTTP {status}: {text}")));
        }

        serde_json::from_str::<ForecastResponse>(&text)
            .map_err(|e| upstream("decode", format!("unexpected forecast response: {e}")))
    }
}

#[async_trait::async_trait]
impl ForecastProvider for OpenMeteoClient {
    fn provider_name(&self) -> &'static str {
        "open_meteo"
    }

    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
        days: u32,
        locale: &str,
    ) -> Result<Vec<ForecastDay>, GenerationError> {
        tracing::debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            days,
            locale,
            "fetching Open-Meteo forecast"
        );
        let res = self.fetch_daily(coordinates).await?;
        to_forecast_days(res, days, locale)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub daily: Option<DailySeries>,
}

/// Parallel arrays indexed by day offset.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default, alias = "weather_code")]
    pub weathercode: Vec<Option<i32>>,
}

pub fn to_forecast_days(
    res: ForecastResponse,
    days: u32,
    locale: &str,
) -> Result<Vec<ForecastDay>, GenerationError> {
    let missing = |detail: String| GenerationError::upstream(Upstream::Weather, "decode", detail);

    let daily = res
        .daily
        .ok_or_else(|| missing("forecast response has no daily section".to_string()))?;

    let days = days as usize;
    let available = daily
        .time
        .len()
        .min(daily.temperature_2m_max.len())
        .min(daily.weathercode.len());
    if available < days {
        return Err(missing(format!(
            "forecast has {available} complete days, {days} requested"
        )));
    }

    let mut out = Vec::with_capacity(days);
    for i in 0..days {
        let date = NaiveDate::parse_from_str(&daily.time[i], "%Y-%m-%d")
            .map_err(|e| missing(format!("invalid forecast date {:?}: {e}", daily.time[i])))?;
        let temperature = daily.temperature_2m_max[i]
            .filter(|t| t.is_finite())
            .ok_or_else(|| missing(format!("missing max temperature for {date}")))?;
        let code = daily.weathercode[i]
            .ok_or_else(|| missing(format!("missing weather code for {date}")))?;

        out.push(ForecastDay {
            date,
            label: weekday_label(date, locale),
            // Half-up, like the widget always displayed it.
            temperature_c: (temperature + 0.5).floor() as i32,
            condition_code: code,
            icon_id: icon_for_code(code).to_string(),
        });
    }

    Ok(out)
}

/// Weekday name for `date` in `locale` ("fr-FR", "fr_FR" or "fr").
///
/// Unknown locales get the English name.
pub fn weekday_label(date: NaiveDate, locale: &str) -> String {
    let at_midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    match resolve_locale(locale) {
        Some(loc) => at_midnight.format_localized("%A", loc).to_string(),
        None => at_midnight.format("%A").to_string(),
    }
}

fn resolve_locale(locale: &str) -> Option<chrono::Locale> {
    let name = locale.trim().replace('-', "_");
    if let Ok(loc) = chrono::Locale::try_from(name.as_str()) {
        return Some(loc);
    }
    // Bare language tag: try the country of the same name (fr -> fr_FR).
    if !name.is_empty() && !name.contains('_') {
        let guess = format!("{}_{}", name.to_lowercase(), name.to_uppercase());
        return chrono::Locale::try_from(guess.as_str()).ok();
    }
    None
}
