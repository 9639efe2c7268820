use thiserror::Error;

/// Top-level error returned by [`crate::Assistant`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Weather(#[from] WeatherProviderError),

    #[error(transparent)]
    Model(#[from] ModelProviderError),
}

/// Failures talking to the forecast provider.
#[derive(Debug, Error)]
pub enum WeatherProviderError {
    /// The provider answered with a non-success status. `body` is the raw response text.
    #[error("WeatherAPI forecast request failed with status {status}: {}", truncate_body(.body))]
    Status { status: u16, body: String },

    #[error("Failed to send request to WeatherAPI.com: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse WeatherAPI forecast JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The provider returned a different number of days than requested.
    #[error("WeatherAPI returned {got} forecast day(s), expected {expected}")]
    DayCount { expected: u8, got: usize },
}

/// Failures talking to the chat-completion endpoint.
#[derive(Debug, Error)]
pub enum ModelProviderError {
    #[error("Chat completion request failed with status {status}: {}", truncate_body(.body))]
    Status { status: u16, body: String },

    #[error("Failed to send chat completion request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse chat completion JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Chat completion response contained no choices")]
    EmptyChoices,

    #[error("Failed to serialize tool output: {0}")]
    ToolOutput(#[source] serde_json::Error),
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
