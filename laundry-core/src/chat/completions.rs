use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ModelProviderError;

use super::{ChatMessage, ChatModel, ChatReply, ChatRequest, Tool, ToolChoice};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Client for an OpenAI-compatible `/chat/completions` endpoint (Groq by default).
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    api_key: String,
    base_url: String,
    model: String,
    http: Client,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String) -> Self {
        Self::with_client(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            Client::new(),
        )
    }

    pub fn with_client(api_key: String, base_url: String, model: String, http: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { api_key, base_url, model, http }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ModelProviderError> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            tools: &request.tools,
            tool_choice: request.tool_choice,
        };

        let res = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ModelProviderError::Transport)?;

        let status = res.status();
        let text = res.text().await.map_err(ModelProviderError::Transport)?;

        if !status.is_success() {
            return Err(ModelProviderError::Status { status: status.as_u16(), body: text });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(ModelProviderError::Malformed)?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ModelProviderError::EmptyChoices)?;

        debug!(
            model = %self.model,
            tool_calls = reply.tool_calls.as_ref().map_or(0, Vec::len),
            "received chat completion"
        );

        Ok(reply)
    }
}
