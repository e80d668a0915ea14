use crate::errors::{AppraisalError, AppraisalResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Wire protocol spoken by the inference endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Any server exposing `/chat/completions` (Ollama, LM Studio, vLLM)
    #[default]
    OpenaiCompatible,
    /// api.openai.com, bearer key required
    Openai,
    /// api.anthropic.com `/v1/messages`, key required
    Anthropic,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenaiCompatible => "openai-compatible",
            ProviderKind::Openai => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::OpenaiCompatible)
    }
}

impl FromStr for ProviderKind {
    type Err = AppraisalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai-compatible" | "local" | "ollama" | "lmstudio" => {
                Ok(ProviderKind::OpenaiCompatible)
            }
            "openai" => Ok(ProviderKind::Openai),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(AppraisalError::Configuration(format!(
                "unsupported provider: {other}"
            ))),
        }
    }
}

/// Runtime settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model identifier passed with every completion request
    pub model: String,
    /// Inference endpoint base URL
    pub endpoint: String,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,

    /// Directory holding goals.yaml, attributes.yaml and the context files
    pub input_dir: PathBuf,
    /// Final comments file; relative paths resolve against the working directory
    pub output_path: PathBuf,

    /// Issue a second model call to proofread each draft
    pub proofread: bool,
    pub max_comment_chars: usize,

    /// Base URL of the portal automation bridge
    pub portal_url: String,
    /// Where the portal session is kept between runs
    pub session_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "qwen3:4b-instruct-2507-q4_K_M".to_string(),
            endpoint: "http://localhost:11434/v1".to_string(),
            provider: ProviderKind::default(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 1000,
            request_timeout_secs: 120,
            input_dir: PathBuf::from("ContinousFeedback/details"),
            output_path: PathBuf::from("ContinousFeedback/details/final_comments.yaml"),
            proofread: true,
            max_comment_chars: 1000,
            portal_url: "http://localhost:4444".to_string(),
            session_path: PathBuf::from("ContinousFeedback/session.json"),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> AppraisalResult<()> {
        if self.model.trim().is_empty() {
            return Err(AppraisalError::Configuration("model cannot be empty".into()));
        }
        validate_url("endpoint", &self.endpoint)?;
        validate_url("portal_url", &self.portal_url)?;

        if self.provider.requires_api_key()
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(AppraisalError::Configuration(format!(
                "provider {} requires an api_key",
                self.provider.name()
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppraisalError::Configuration(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AppraisalError::Configuration("max_tokens must be positive".into()));
        }
        if self.max_comment_chars == 0 {
            return Err(AppraisalError::Configuration(
                "max_comment_chars must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> AppraisalResult<()> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(AppraisalError::Configuration(format!(
            "{field} must be an http(s) URL, got '{value}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.endpoint = "localhost:11434".into();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.provider = ProviderKind::Anthropic;
        assert!(settings.validate().is_err());
        settings.api_key = Some("sk-test".into());
        assert!(settings.validate().is_ok());

        let mut settings = Settings::default();
        settings.max_comment_chars = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::OpenaiCompatible);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"model": "llama3.2"}"#).unwrap();
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.endpoint, Settings::default().endpoint);
        assert!(settings.proofread);
    }
}
