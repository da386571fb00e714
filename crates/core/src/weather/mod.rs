pub mod icons;
pub mod open_meteo;

use crate::domain::forecast::{Coordinates, ForecastDay};
use crate::error::GenerationError;

#[async_trait::async_trait]
pub trait ForecastProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Returns exactly `days` days in chronological order, or an error.
    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
        days: u32,
        locale: &str,
    ) -> Result<Vec<ForecastDay>, GenerationError>;
}
