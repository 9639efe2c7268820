use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer, de::IgnoredAny};
use tracing::{debug, instrument};

use crate::{
    error::WeatherProviderError,
    model::{ForecastDaySummary, ForecastRequest, RainChance},
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Forecast client for WeatherAPI.com.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, DEFAULT_BASE_URL.to_string(), Client::new())
    }

    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { api_key, base_url, http }
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast.json", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    maxtemp_c: f64,
    mintemp_c: f64,
    avghumidity: f64,
    #[serde(default, deserialize_with = "lenient_percent")]
    daily_chance_of_rain: Option<f64>,
    maxwind_kph: f64,
    totalprecip_mm: f64,
    condition: WaCondition,
}

/// Accepts the percentage as a number or a numeric string. Anything else reads as
/// not reported instead of failing the whole forecast.
fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reported {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Reported>::deserialize(deserializer)? {
        Some(Reported::Number(n)) => Some(n),
        Some(Reported::Text(s)) => s.trim().parse().ok(),
        Some(Reported::Other(_)) | None => None,
    })
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

impl From<WaForecastDay> for ForecastDaySummary {
    fn from(entry: WaForecastDay) -> Self {
        let day = entry.day;
        Self {
            date: entry.date,
            avg_temp_c: day.avgtemp_c,
            max_temp_c: day.maxtemp_c,
            min_temp_c: day.mintemp_c,
            avg_humidity: day.avghumidity,
            daily_chance_of_rain: RainChance::from_reported(day.daily_chance_of_rain),
            max_wind_kph: day.maxwind_kph,
            total_precip_mm: day.totalprecip_mm,
            condition: day.condition.text,
        }
    }
}

/// Projects a raw `forecast.json` body onto the laundry-relevant fields.
///
/// The body must hold exactly `expected` days; anything else is an error rather
/// than a partial forecast.
pub fn parse_forecast(
    body: &str,
    expected: u8,
) -> Result<Vec<ForecastDaySummary>, WeatherProviderError> {
    let parsed: WaForecastResponse =
        serde_json::from_str(body).map_err(WeatherProviderError::Malformed)?;

    let days = parsed.forecast.forecastday;
    if days.len() != usize::from(expected) {
        return Err(WeatherProviderError::DayCount { expected, got: days.len() });
    }

    Ok(days.into_iter().map(ForecastDaySummary::from).collect())
}

#[async_trait]
impl ForecastProvider for WeatherApiProvider {
    #[instrument(skip(self, request), fields(location = %request.location, days = request.days))]
    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Vec<ForecastDaySummary>, WeatherProviderError> {
        let horizon = request.days.to_string();
        let res = self
            .http
            .get(self.forecast_url())
            .query(&[
                ("q", request.location.as_str()),
                ("days", horizon.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(WeatherProviderError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherProviderError::Transport)?;

        if !status.is_success() {
            return Err(WeatherProviderError::Status { status: status.as_u16(), body });
        }

        let days = parse_forecast(&body, request.days)?;
        debug!(count = days.len(), "received forecast days");

        Ok(days)
    }
}
