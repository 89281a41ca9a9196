use crate::config::Config;
use crate::errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Output-length cap for generated replies.
pub const MAX_REPLY_TOKENS: u32 = 400;
/// Low temperature keeps the assistant's phrasing close to deterministic.
pub const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Client for the hosted chat-completion API.
///
/// Each call sends the system prompt and one user message; nothing is remembered between
/// calls.
#[derive(Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
}

impl ChatRelay {
    /// Creates a new `ChatRelay` from the loaded configuration.
    ///
    /// A missing API key is not an error here; [`ChatRelay::reply`] reports it per call.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            AppError::InternalError(format!("Failed to create completion client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Request payload for one user message.
    pub fn build_request(&self, user_message: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": user_message}
            ],
            "max_tokens": MAX_REPLY_TOKENS,
            "temperature": TEMPERATURE
        })
    }

    /// Generates the assistant's reply to `user_message`.
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The first choice's text, `NotConfigured` when no API
    ///   key is set, or `ExternalApiError` carrying the upstream error text.
    pub async fn reply(&self, user_message: &str) -> Result<String, AppError> {
        let Some(ref api_key) = self.api_key else {
            return Err(AppError::NotConfigured(
                "OpenAI key not configured on server".to_string(),
            ));
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::info!("Requesting completion from {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request(user_message))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI error: {}", e);
                AppError::ExternalApiError(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("OpenAI returned {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "OpenAI returned {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("OpenAI error: {}", e);
            AppError::ExternalApiError(format!("Failed to parse completion response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                tracing::error!("OpenAI error: completion contained no reply text");
                AppError::ExternalApiError("Completion response contained no reply".to_string())
            })
    }
}
