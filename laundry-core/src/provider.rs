use crate::{
    error::WeatherProviderError,
    model::{ForecastDaySummary, ForecastRequest},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

pub use weatherapi::WeatherApiProvider;

/// Source of per-day forecast summaries.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Returns one summary per forecast day, in the order the provider reports them.
    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Vec<ForecastDaySummary>, WeatherProviderError>;
}

