use anyhow::{anyhow, Context, Result};
use domain::config::{ProviderKind, Settings};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

/// Builds [`Settings`] from defaults, the first config file found, and
/// `APPRAISAL_*` environment variables, in that order.
pub struct SettingsLoader {
    explicit_path: Option<PathBuf>,
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            config_paths: Self::default_config_paths(),
            env_prefix: "APPRAISAL_".to_string(),
        }
    }

    /// Use `path` instead of searching; a missing file is an error
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.explicit_path = Some(path);
        self
    }

    pub fn with_env_prefix(mut self, prefix: String) -> Self {
        self.env_prefix = prefix;
        self
    }

    /// Replace the search list (tests use this to stay off the real home dir)
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config_paths = paths;
        self
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("appraisal.toml"),
            PathBuf::from("appraisal.yaml"),
            PathBuf::from("appraisal.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("appraisal").join("config.toml"));
            paths.push(config_dir.join("appraisal").join("config.yaml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("appraisal").join("config.toml"));
        }

        paths
    }

    pub async fn load(&self) -> Result<(Settings, ConfigSource)> {
        let (mut settings, source) = match &self.explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {}", path.display()));
                }
                let settings = self.load_file(path).await?;
                info!("Loaded configuration from: {}", path.display());
                (settings, ConfigSource::File(path.clone()))
            }
            None => self.load_first_found().await?,
        };

        self.apply_env_overrides(&mut settings)?;
        debug!("Effective settings: model={}, endpoint={}", settings.model, settings.endpoint);

        Ok((settings, source))
    }

    async fn load_first_found(&self) -> Result<(Settings, ConfigSource)> {
        for path in &self.config_paths {
            if path.exists() {
                let settings = self
                    .load_file(path)
                    .await
                    .with_context(|| format!("Invalid config file {}", path.display()))?;
                info!("Loaded configuration from: {}", path.display());
                return Ok((settings, ConfigSource::File(path.clone())));
            }
        }
        debug!("No config file found, using defaults");
        Ok((Settings::default(), ConfigSource::Default))
    }

    async fn load_file(&self, path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" | "" => toml::from_str(&content).context("Failed to parse TOML config"),
            "yaml" | "yml" => serde_yaml::from_str(&content).context("Failed to parse YAML config"),
            "json" => serde_json::from_str(&content).context("Failed to parse JSON config"),
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .context("Failed to parse config file"),
        }
    }

    fn env_var(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", self.env_prefix, key))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    fn env_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.env_var(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring {}{}: cannot parse '{}'", self.env_prefix, key, raw);
                None
            }
        }
    }

    fn apply_env_overrides(&self, settings: &mut Settings) -> Result<()> {
        if let Some(model) = self.env_var("MODEL") {
            settings.model = model;
        }
        if let Some(endpoint) = self.env_var("ENDPOINT") {
            settings.endpoint = endpoint;
        }
        if let Some(provider) = self.env_var("PROVIDER") {
            settings.provider = ProviderKind::from_str(&provider)
                .map_err(|e| anyhow!("{}PROVIDER: {}", self.env_prefix, e))?;
        }
        if let Some(api_key) = self.env_var("API_KEY") {
            settings.api_key = Some(api_key);
        }
        if let Some(temperature) = self.env_parsed("TEMPERATURE") {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.env_parsed("MAX_TOKENS") {
            settings.max_tokens = max_tokens;
        }
        if let Some(timeout) = self.env_parsed("REQUEST_TIMEOUT_SECS") {
            settings.request_timeout_secs = timeout;
        }
        if let Some(dir) = self.env_var("INPUT_DIR") {
            settings.input_dir = PathBuf::from(dir);
        }
        if let Some(path) = self.env_var("OUTPUT_PATH") {
            settings.output_path = PathBuf::from(path);
        }
        if let Some(proofread) = self.env_parsed("PROOFREAD") {
            settings.proofread = proofread;
        }
        if let Some(max_chars) = self.env_parsed("MAX_COMMENT_CHARS") {
            settings.max_comment_chars = max_chars;
        }
        if let Some(url) = self.env_var("PORTAL_URL") {
            settings.portal_url = url;
        }
        if let Some(path) = self.env_var("SESSION_PATH") {
            settings.session_path = PathBuf::from(path);
        }
        Ok(())
    }
}
