//! Configuration management for Cue.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.cue/config.yaml` in the workspace, or `CUE_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .cue/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider used for enhancement (e.g., "ollama", "openai")
    pub provider: String,

    /// Model identifier used for enhancement
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Detection pipeline settings
    pub detection: DetectionSettings,

    /// OCR collaborator settings
    pub ocr: OcrSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Request timeout configured for this provider.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            ProviderConfig::Ollama { timeout, .. } => timeout.map(Duration::from_secs),
            ProviderConfig::OpenAI { .. } => None,
        }
    }

    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }
}

/// Detection pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSettings {
    /// Minimum combined confidence for a result to be reported
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,

    /// Run AI enhancement when a provider is available
    #[serde(default = "default_true")]
    pub use_ai: bool,

    /// Upper bound on one enhancement round-trip
    #[serde(default = "default_ai_timeout")]
    pub ai_timeout_secs: u64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            use_ai: true,
            ai_timeout_secs: default_ai_timeout(),
        }
    }
}

/// OCR collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Provider backing the vision model
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Vision-capable model used for transcription
    #[serde(default = "default_ocr_model")]
    pub model: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_ocr_model(),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_ai_timeout() -> u64 {
    8
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_ocr_model() -> String {
    "llava".to_string()
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    detection: Option<DetectionSettings>,
    ocr: Option<OcrSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: default_provider(),
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            detection: DetectionSettings::default(),
            ocr: OcrSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `CUE_WORKSPACE`: Override workspace path
    /// - `CUE_CONFIG`: Path to config file
    /// - `CUE_PROVIDER`: LLM provider
    /// - `CUE_MODEL`: Model identifier
    /// - `CUE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Either path, when given, replaces `CUE_WORKSPACE` / `CUE_CONFIG` and
    /// decides which YAML file is merged. An explicitly named config file
    /// must exist.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("CUE_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("CUE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = &config.config_file {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.cue_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CUE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CUE_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("CUE_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(detection) = config_file.detection {
            result.detection = detection;
        }

        if let Some(ocr) = config_file.ocr {
            result.ocr = ocr;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .cue directory.
    pub fn cue_dir(&self) -> PathBuf {
        self.workspace.join(".cue")
    }

    /// Get the configuration for a provider, if the config file declares one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for a provider.
    ///
    /// `CUE_API_KEY` wins; otherwise the provider's `apiKeyEnv` is consulted.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate configuration before any collaborator is built.
    ///
    /// The threshold must lie in `[0, 1]` and an enabled OCR provider must be
    /// known. Problems with the enhancement provider are only logged: the
    /// detector runs without AI in that case.
    pub fn validate(&self) -> AppResult<()> {
        let threshold = self.detection.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "confidenceThreshold must be within [0, 1], got {}",
                threshold
            )));
        }

        if self.ocr.enabled && !KNOWN_PROVIDERS.contains(&self.ocr.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown OCR provider: {}. Supported: {}",
                self.ocr.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.detection.use_ai {
            if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
                tracing::warn!(
                    "Unknown provider {}; AI enhancement will be disabled",
                    self.provider
                );
            } else if let Some(ProviderConfig::OpenAI { api_key_env, .. }) =
                self.get_provider_config(&self.provider)
            {
                if self.api_key.is_none() && std::env::var(api_key_env).is_err() {
                    tracing::warn!(
                        "API key not found in {}; AI enhancement will be disabled",
                        api_key_env
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.detection.confidence_threshold, 0.5);
        assert!(config.detection.use_ai);
        assert!(!config.ocr.enabled);
        assert!(!config.verbose);
    }

    #[test]
    fn test_cue_dir() {
        let config = AppConfig::default();
        assert!(config.cue_dir().ends_with(".cue"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o-mini");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: qwen2.5
      timeout: 20
detection:
  confidenceThreshold: 0.65
  useAi: false
ocr:
  enabled: true
  model: llava:13b
logging:
  level: debug
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "qwen2.5");
        assert_eq!(merged.detection.confidence_threshold, 0.65);
        assert!(!merged.detection.use_ai);
        assert_eq!(merged.detection.ai_timeout_secs, 8);
        assert!(merged.ocr.enabled);
        assert_eq!(merged.ocr.provider, "ollama");
        assert_eq!(merged.ocr.model, "llava:13b");
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.no_color);
        assert_eq!(
            merged.get_provider_config("ollama").and_then(|p| p.endpoint()),
            Some("http://localhost:11434")
        );
        assert_eq!(
            merged.get_provider_config("ollama").and_then(|p| p.timeout()),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let workspace = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("interview.yaml");
        std::fs::write(&path, "detection:\n  confidenceThreshold: 0.72\n").unwrap();

        let config =
            AppConfig::load_from(Some(workspace.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, workspace.path());
        assert_eq!(config.config_file.as_deref(), Some(path.as_path()));
        assert_eq!(config.detection.confidence_threshold, 0.72);
    }

    #[test]
    fn test_load_from_workspace_config() {
        let workspace = TempDir::new().unwrap();
        std::fs::create_dir_all(workspace.path().join(".cue")).unwrap();
        std::fs::write(
            workspace.path().join(".cue/config.yaml"),
            "detection:\n  useAi: false\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(workspace.path().to_path_buf()), None).unwrap();
        assert!(!config.detection.use_ai);
    }

    #[test]
    fn test_load_from_missing_config_file() {
        let workspace = TempDir::new().unwrap();
        let result = AppConfig::load_from(
            Some(workspace.path().to_path_buf()),
            Some(workspace.path().join("missing.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "detection: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_ai_provider_only_warns() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_ocr_provider() {
        let mut config = AppConfig::default();
        config.ocr.provider = "unknown".to_string();
        assert!(config.validate().is_ok());

        config.ocr.enabled = true;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut config = AppConfig::default();
        config.detection.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
