use crate::domain::forecast::Coordinates;
use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HEADER: &str = "What's for dinner";
pub const DEFAULT_NUM_PORTIONS: u32 = 4;
pub const DEFAULT_MAX_PREP_TIME: u32 = 30;
pub const DEFAULT_NUM_SUGGESTIONS: u32 = 3;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_FORECAST_DAYS: u32 = 7;
pub const DEFAULT_LOCALE: &str = "en-US";
pub const DEFAULT_REFRESH_INTERVAL_HOURS: f64 = 24.0;
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Widget configuration as the display layer sends it.
///
/// Every field is optional here; [`WidgetConfig::preflight`] decides what a
/// generation run can do without.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub header: Option<String>,
    pub num_portions: Option<u32>,
    pub max_prep_time: Option<u32>,
    pub num_suggestions: Option<u32>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub language: Option<String>,
    pub forecast_days: Option<u32>,
    pub locale: Option<String>,
    /// Hours between two scheduled refreshes.
    pub refresh_interval: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub groq_api_key: Option<String>,
}

/// Validated input of one generation run. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub num_portions: u32,
    pub max_prep_time_minutes: u32,
    pub num_suggestions_per_day: u32,
    pub dietary_restrictions: Vec<String>,
    pub output_language: String,
    pub forecast_days: u32,
    pub locale: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone)]
pub struct Preflight {
    pub generation: GenerationConfig,
    pub api_key: String,
}

impl WidgetConfig {
    /// Reads `DINNER_*` variables and fills the widget defaults.
    pub fn from_env() -> Self {
        Self {
            header: env_string("DINNER_HEADER"),
            num_portions: env_parse("DINNER_NUM_PORTIONS"),
            max_prep_time: env_parse("DINNER_MAX_PREP_TIME"),
            num_suggestions: env_parse("DINNER_NUM_SUGGESTIONS"),
            dietary_restrictions: env_string("DINNER_DIETARY_RESTRICTIONS")
                .map(|s| split_list(&s)),
            language: env_string("DINNER_LANGUAGE"),
            forecast_days: env_parse("DINNER_FORECAST_DAYS"),
            locale: env_string("DINNER_LOCALE"),
            refresh_interval: env_parse("DINNER_REFRESH_INTERVAL"),
            lat: env_parse("DINNER_LAT"),
            lon: env_parse("DINNER_LON"),
            groq_api_key: None,
        }
        .with_defaults()
    }

    pub fn with_defaults(self) -> Self {
        Self {
            header: self.header.or_else(|| Some(DEFAULT_HEADER.to_string())),
            num_portions: self.num_portions.or(Some(DEFAULT_NUM_PORTIONS)),
            max_prep_time: self.max_prep_time.or(Some(DEFAULT_MAX_PREP_TIME)),
            num_suggestions: self.num_suggestions.or(Some(DEFAULT_NUM_SUGGESTIONS)),
            dietary_restrictions: self.dietary_restrictions.or_else(|| Some(Vec::new())),
            language: self.language.or_else(|| Some(DEFAULT_LANGUAGE.to_string())),
            forecast_days: self.forecast_days.or(Some(DEFAULT_FORECAST_DAYS)),
            locale: self.locale.or_else(|| Some(DEFAULT_LOCALE.to_string())),
            refresh_interval: self
                .refresh_interval
                .or(Some(DEFAULT_REFRESH_INTERVAL_HOURS)),
            lat: self.lat,
            lon: self.lon,
            groq_api_key: self.groq_api_key,
        }
    }

    /// Never shorter than [`MIN_REFRESH_INTERVAL`].
    pub fn refresh_interval(&self) -> Duration {
        let hours = self
            .refresh_interval
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_HOURS);
        Duration::try_from_secs_f64(hours * 3600.0)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_HOURS * 3600.0))
            .max(MIN_REFRESH_INTERVAL)
    }

    /// Checks everything a run needs before any network call.
    ///
    /// Order: credential, location, generation parameters. The credential in
    /// the config wins over `fallback_api_key`.
    pub fn preflight(&self, fallback_api_key: Option<&str>) -> Result<Preflight, GenerationError> {
        let api_key = self
            .groq_api_key
            .as_deref()
            .or(fallback_api_key)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(GenerationError::missing_credential)?
            .to_string();

        Ok(Preflight {
            generation: self.generation_config()?,
            api_key,
        })
    }

    /// Location and generation parameters, without the credential check.
    pub fn generation_config(&self) -> Result<GenerationConfig, GenerationError> {
        let coordinates = match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Coordinates {
                    latitude,
                    longitude,
                }
            }
            _ => return Err(GenerationError::missing_location()),
        };

        let required = [
            ("numPortions", self.num_portions),
            ("maxPrepTime", self.max_prep_time),
            ("numSuggestions", self.num_suggestions),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| !matches!(v, Some(n) if *n > 0))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(GenerationError::missing_parameters(&missing));
        }

        let dietary_restrictions = self
            .dietary_restrictions
            .iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(GenerationConfig {
            num_portions: self.num_portions.unwrap_or(DEFAULT_NUM_PORTIONS),
            max_prep_time_minutes: self.max_prep_time.unwrap_or(DEFAULT_MAX_PREP_TIME),
            num_suggestions_per_day: self.num_suggestions.unwrap_or(DEFAULT_NUM_SUGGESTIONS),
            dietary_restrictions,
            output_language: non_blank(self.language.as_deref())
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
            forecast_days: self
                .forecast_days
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_FORECAST_DAYS),
            locale: non_blank(self.locale.as_deref())
                .unwrap_or(DEFAULT_LOCALE)
                .to_string(),
            coordinates,
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
