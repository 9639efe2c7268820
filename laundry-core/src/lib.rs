//! Core library for the `laundry` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI.com forecast client
//! - An OpenAI-compatible chat-completion client with tool calling
//! - The [`Assistant`] that ties both together into a laundry-day recommendation
//!
//! It is used by `laundry-cli`, but can also be reused by other binaries or services.

pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use assistant::Assistant;
pub use chat::{ChatCompletionsClient, ChatModel};
pub use config::{AssistantConfig, Config};
pub use error::{Error, ModelProviderError, WeatherProviderError};
pub use model::{ForecastDaySummary, ForecastRequest, RainChance};
pub use provider::{ForecastProvider, WeatherApiProvider};
