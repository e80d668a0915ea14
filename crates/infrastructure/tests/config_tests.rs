use domain::config::{ProviderKind, Settings};
use infrastructure::config::{ConfigSource, SettingsLoader};
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs;

// Each test uses its own env prefix so parallel tests do not see each other
fn loader(prefix: &str) -> SettingsLoader {
    SettingsLoader::new()
        .with_search_paths(Vec::new())
        .with_env_prefix(prefix.to_string())
}

#[tokio::test]
async fn test_defaults_without_config_file() -> anyhow::Result<()> {
    let (settings, source) = loader("APPRAISAL_T_DEFAULTS_").load().await?;

    assert_eq!(source, ConfigSource::Default);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.endpoint, "http://localhost:11434/v1");
    assert_eq!(settings.temperature, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_loader_from_toml() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("appraisal.toml");

    let toml_content = r#"
model = "llama3.2"
endpoint = "http://gpu-box:8000/v1"
proofread = false
max_comment_chars = 400
input_dir = "data/details"
"#;
    fs::write(&config_path, toml_content).await?;

    let (settings, source) = loader("APPRAISAL_T_TOML_")
        .with_path(config_path.clone())
        .load()
        .await?;

    assert_eq!(source, ConfigSource::File(config_path));
    assert_eq!(settings.model, "llama3.2");
    assert_eq!(settings.endpoint, "http://gpu-box:8000/v1");
    assert!(!settings.proofread);
    assert_eq!(settings.max_comment_chars, 400);
    assert_eq!(settings.input_dir, PathBuf::from("data/details"));
    // Untouched keys keep their defaults
    assert_eq!(settings.max_tokens, Settings::default().max_tokens);
    Ok(())
}

#[tokio::test]
async fn test_loader_from_yaml_search_path() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("appraisal.toml");
    let yaml_path = temp_dir.path().join("appraisal.yaml");
    fs::write(&yaml_path, "model: phi4\nprovider: openai\napi_key: sk-1\n").await?;

    let (settings, source) = SettingsLoader::new()
        .with_search_paths(vec![missing, yaml_path.clone()])
        .with_env_prefix("APPRAISAL_T_YAML_".to_string())
        .load()
        .await?;

    assert_eq!(source, ConfigSource::File(yaml_path));
    assert_eq!(settings.model, "phi4");
    assert_eq!(settings.provider, ProviderKind::Openai);
    assert_eq!(settings.api_key.as_deref(), Some("sk-1"));
    Ok(())
}

#[tokio::test]
async fn test_env_overrides_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("appraisal.toml");
    fs::write(&config_path, "model = \"from-file\"\n").await?;

    env::set_var("APPRAISAL_T_ENV_MODEL", "from-env");
    env::set_var("APPRAISAL_T_ENV_PROOFREAD", "false");
    env::set_var("APPRAISAL_T_ENV_MAX_TOKENS", "not-a-number");

    let result = loader("APPRAISAL_T_ENV_").with_path(config_path).load().await;

    env::remove_var("APPRAISAL_T_ENV_MODEL");
    env::remove_var("APPRAISAL_T_ENV_PROOFREAD");
    env::remove_var("APPRAISAL_T_ENV_MAX_TOKENS");

    let (settings, _) = result?;
    assert_eq!(settings.model, "from-env");
    assert!(!settings.proofread);
    // Unparseable values are ignored
    assert_eq!(settings.max_tokens, Settings::default().max_tokens);
    Ok(())
}

#[tokio::test]
async fn test_invalid_provider_in_env_is_an_error() {
    env::set_var("APPRAISAL_T_BADPROV_PROVIDER", "bard");
    let result = loader("APPRAISAL_T_BADPROV_").load().await;
    env::remove_var("APPRAISAL_T_BADPROV_PROVIDER");

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_explicit_config_is_an_error() {
    let result = loader("APPRAISAL_T_MISSING_")
        .with_path(PathBuf::from("/definitely/not/here.toml"))
        .load()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_broken_config_file_is_an_error() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("appraisal.toml");
    fs::write(&config_path, "model = [unterminated").await?;

    let result = loader("APPRAISAL_T_BROKEN_").with_path(config_path).load().await;
    assert!(result.is_err());
    Ok(())
}
