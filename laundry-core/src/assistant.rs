//! The laundry-day assistant.
//!
//! One recommendation runs at most two completion rounds:
//!
//! 1. the model sees the prompt and the `call_weather_api` tool and either
//!    answers directly or asks for the forecast;
//! 2. if it asked, the forecast is fetched and sent back as a `tool` turn
//!    answering the first tool call, and the model's second reply is returned.
//!
//! Only the first tool call of a reply is executed and answered. Any further
//! calls in the same reply are dropped.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    chat::{ChatCompletionsClient, ChatMessage, ChatModel, ChatRequest, Tool, ToolChoice},
    config::{AssistantConfig, Config},
    error::{Error, ModelProviderError},
    model::{ForecastDaySummary, ForecastRequest},
    provider::{ForecastProvider, WeatherApiProvider},
};

pub const WEATHER_TOOL_NAME: &str = "call_weather_api";

pub const SYSTEM_PROMPT: &str = "You are a laundry planning assistant. Use the weather \
forecast to identify the best laundry day given the forecast: prefer dry, sunny, breezy \
days with a low chance of rain and low humidity.";

/// Builds the user prompt for a location.
pub fn user_prompt(location: &str) -> String {
    format!(
        "I live in {location}. Based on the upcoming weather forecast, which day is the \
         best day to do my laundry and dry it outside? Explain briefly why."
    )
}

/// Declaration of the forecast tool offered to the model.
pub fn weather_tool() -> Tool {
    Tool::function(
        WEATHER_TOOL_NAME,
        "Get the multi-day weather forecast (temperature, humidity, chance of rain, wind, \
         precipitation, condition) for a location.",
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City or place name, e.g. Tuguegarao"
                }
            },
            "required": ["location"]
        }),
    )
}

/// Combines a forecast source with a chat model to recommend a laundry day.
#[derive(Debug)]
pub struct Assistant<P, M> {
    forecast: P,
    model: M,
    request: ForecastRequest,
}

impl Assistant<WeatherApiProvider, ChatCompletionsClient> {
    /// Build the production assistant from raw settings.
    ///
    /// Fails with [`Error::Configuration`] when a credential is missing; no request
    /// is made in that case.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let settings = config.validate()?;
        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &AssistantConfig) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let forecast = WeatherApiProvider::with_client(
            settings.weather_api_key.clone(),
            settings.weather_base_url.clone(),
            http.clone(),
        );
        let model = ChatCompletionsClient::with_client(
            settings.model_api_key.clone(),
            settings.model_base_url.clone(),
            settings.model.clone(),
            http,
        );

        Self::new(forecast, model, settings.forecast_request())
    }
}

impl<P, M> Assistant<P, M>
where
    P: ForecastProvider,
    M: ChatModel,
{
    /// Fails with [`Error::Configuration`] if the location is blank or the horizon
    /// is out of range.
    pub fn new(forecast: P, model: M, request: ForecastRequest) -> Result<Self, Error> {
        request.validate()?;
        Ok(Self { forecast, model, request })
    }

    pub fn location(&self) -> &str {
        &self.request.location
    }

    pub fn forecast_days(&self) -> u8 {
        self.request.days
    }

    /// Fetch the forecast for the configured location and horizon.
    pub async fn fetch_forecast(&self) -> Result<Vec<ForecastDaySummary>, Error> {
        Ok(self.forecast.fetch_forecast(&self.request).await?)
    }

    /// Ask the model for a laundry-day recommendation, running the forecast tool
    /// if the model requests it. The model's text is returned unmodified.
    pub async fn get_recommendation(&self) -> Result<String, Error> {
        self.recommend(None).await
    }

    /// Like [`Assistant::get_recommendation`], but answers a tool call with an
    /// already fetched forecast instead of querying the provider again.
    pub async fn get_recommendation_with_forecast(
        &self,
        days: &[ForecastDaySummary],
    ) -> Result<String, Error> {
        self.recommend(Some(days)).await
    }

    #[instrument(skip(self, known), fields(location = %self.request.location))]
    async fn recommend(&self, known: Option<&[ForecastDaySummary]>) -> Result<String, Error> {
        let system = ChatMessage::system(SYSTEM_PROMPT);
        let user = ChatMessage::user(user_prompt(&self.request.location));

        let first = self
            .model
            .complete(&ChatRequest {
                messages: vec![system.clone(), user.clone()],
                tools: vec![weather_tool()],
                tool_choice: Some(ToolChoice::Auto),
            })
            .await?;

        let Some(call) = first.first_tool_call() else {
            debug!("model answered without calling the forecast tool");
            return Ok(first.text().to_string());
        };

        let requested = first.tool_calls.as_ref().map_or(0, Vec::len);
        if requested > 1 {
            warn!(requested, "model requested several tool calls; only the first is answered");
        }
        if call.function.name != WEATHER_TOOL_NAME {
            warn!(tool = %call.function.name, "model called an unknown tool; answering with the forecast");
        }
        // The model's `location` argument is ignored: the configured location wins.
        info!(tool_call_id = %call.id, "model requested the forecast");

        let payload = match known {
            Some(days) => serde_json::to_string(days),
            None => serde_json::to_string(&self.fetch_forecast().await?),
        }
        .map_err(ModelProviderError::ToolOutput)?;

        let second = self
            .model
            .complete(&ChatRequest {
                messages: vec![
                    system,
                    user,
                    ChatMessage::assistant_tool_call(call.clone()),
                    ChatMessage::tool_result(call.id.clone(), payload),
                ],
                tools: vec![weather_tool()],
                tool_choice: Some(ToolChoice::Auto),
            })
            .await?;

        Ok(second.text().to_string())
    }
}
