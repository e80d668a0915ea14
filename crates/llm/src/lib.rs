use async_trait::async_trait;
use domain::{ModelError, ProviderKind, Settings, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Any `/chat/completions` server; Ollama and LM Studio ignore the key
    OpenAICompatible {
        url: String,
        api_key: Option<String>,
    },
    OpenAI {
        url: String,
        api_key: String,
    },
    Anthropic {
        url: String,
        api_key: String,
    },
}

impl LlmProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self, ModelError> {
        let url = settings.endpoint.clone();
        let key = || {
            settings
                .api_key
                .clone()
                .ok_or_else(|| ModelError::Request(format!(
                    "{} provider requires an api key",
                    settings.provider.name()
                )))
        };
        Ok(match settings.provider {
            ProviderKind::OpenaiCompatible => LlmProvider::OpenAICompatible {
                url,
                api_key: settings.api_key.clone(),
            },
            ProviderKind::Openai => LlmProvider::OpenAI { url, api_key: key()? },
            ProviderKind::Anthropic => LlmProvider::Anthropic { url, api_key: key()? },
        })
    }

    fn name(&self) -> &'static str {
        match self {
            LlmProvider::OpenAICompatible { .. } => "OpenAI-compatible",
            LlmProvider::OpenAI { .. } => "OpenAI",
            LlmProvider::Anthropic { .. } => "Anthropic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            model: None,
            max_tokens: None,
            temperature: None,
            system_prompt: None,
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string());
        self
    }
}

#[derive(Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    client: reqwest::Client,
    default_model: String,
    max_tokens: u32,
    temperature: f32,
}

// OpenAI API types
#[derive(Debug, Serialize, Deserialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, model: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            default_model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ModelError> {
        let provider = LlmProvider::from_settings(settings)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;

        info!(
            "Language model: {} ({}) at {}",
            provider.name(),
            settings.model,
            settings.endpoint
        );

        Ok(Self {
            provider,
            client,
            default_model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let max_tokens = request.max_tokens.unwrap_or(self.max_tokens);
        let temperature = request.temperature.unwrap_or(self.temperature);

        debug!("Prompt for {}: {}", model, request.prompt);

        let text = match &self.provider {
            LlmProvider::OpenAICompatible { url, api_key } => {
                self.openai_chat(url, api_key.as_deref(), &model, &request, max_tokens, temperature)
                    .await?
            }
            LlmProvider::OpenAI { url, api_key } => {
                self.openai_chat(url, Some(api_key), &model, &request, max_tokens, temperature)
                    .await?
            }
            LlmProvider::Anthropic { url, api_key } => {
                self.anthropic_chat(url, api_key, &model, &request, max_tokens, temperature)
                    .await?
            }
        };

        if text.trim().is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(text)
    }

    async fn openai_chat(
        &self,
        url: &str,
        api_key: Option<&str>,
        model: &str,
        request: &CompletionRequest,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ModelError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(&request.prompt));

        let body = OpenAIChatRequest {
            model: model.to_string(),
            messages,
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        };

        info!("Sending request to {}: {}", self.provider.name(), model);

        let endpoint = format!("{}/chat/completions", url.trim_end_matches('/'));
        let mut builder = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("{} error {}: {}", self.provider.name(), status, error_text);
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let chat_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        match chat_response.choices.into_iter().next() {
            Some(choice) => {
                debug!("Received completion from {}", self.provider.name());
                choice.message.content.ok_or(ModelError::Empty)
            }
            None => Err(ModelError::Empty),
        }
    }

    async fn anthropic_chat(
        &self,
        url: &str,
        api_key: &str,
        model: &str,
        request: &CompletionRequest,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ModelError> {
        let body = AnthropicRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(&request.prompt)],
            max_tokens,
            system: request.system_prompt.clone(),
            temperature: Some(temperature),
        };

        info!("Sending request to Anthropic: {}", model);

        let endpoint = format!("{}/messages", url.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .header("x-api-key", api_key)
            .header("Content-Type", "application/json")
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Anthropic error {}: {}", status, error_text);
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let chat_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        let text: String = chat_response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }
}

fn request_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Request(format!("timed out: {err}"))
    } else {
        ModelError::Request(err.to_string())
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, ModelError> {
        self.complete(CompletionRequest::new(prompt).model(model))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("Test prompt")
            .model("qwen3")
            .max_tokens(100)
            .temperature(0.0)
            .system_prompt("Be brief");

        assert_eq!(request.prompt, "Test prompt");
        assert_eq!(request.model.as_deref(), Some("qwen3"));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.system_prompt.as_deref(), Some("Be brief"));
    }

    #[test]
    fn test_provider_from_settings() {
        let settings = Settings::default();
        let provider = LlmProvider::from_settings(&settings).unwrap();
        assert!(matches!(provider, LlmProvider::OpenAICompatible { api_key: None, .. }));

        let mut settings = Settings::default();
        settings.provider = ProviderKind::Openai;
        assert!(LlmProvider::from_settings(&settings).is_err());

        settings.api_key = Some("sk-test".into());
        assert!(matches!(
            LlmProvider::from_settings(&settings).unwrap(),
            LlmProvider::OpenAI { .. }
        ));
    }
}
