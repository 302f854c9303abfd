//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! Secrets never live here: the settings only name the environment variables
//! that hold them (see [`crate::config::TrackerCredentials`]).

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LlmProvider
// ---------------------------------------------------------------------------

/// Selects which language-model backend answers questions and extracts JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LlmProvider {
    /// Ollama native `/api/generate` endpoint: no authentication required.
    Ollama,
    /// Any OpenAI-compatible REST API (OpenAI, Groq, LM Studio, vLLM …).
    OpenAiCompatible,
    /// Language model turned off: questions and audio extraction report an
    /// error instead of calling out.
    Disabled,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::Ollama
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the language-model collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which backend to use.
    pub provider: LlmProvider,
    /// Base URL of the API endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// Name of the environment variable holding the API key: `None` for
    /// local providers.
    pub api_key_env: Option<String>,
    /// Model identifier sent to the API (e.g. `"llama3.1"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Per-request timeout in seconds.  `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: "http://localhost:11434".into(),
            api_key_env: None,
            model: "llama3.1".into(),
            temperature: 0.2,
            timeout_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Model id from [`crate::stt::WHISPER_MODELS`] (e.g. `"whisper-base"`).
    pub model: String,
    /// Spoken language as an ISO-639-1 code, or `"auto"` for Whisper's
    /// built-in language detection.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "whisper-base".into(),
            language: "auto".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackerConfig
// ---------------------------------------------------------------------------

/// Issue-tracker endpoint and the names of the environment variables that
/// carry its credential and repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// REST API root, without trailing slash.
    pub api_base: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Environment variable holding the target repository as `owner/name`.
    pub repo_env: String,
    /// `User-Agent` sent with every request (GitHub rejects requests without
    /// one).
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            token_env: "GITHUB_TOKEN".into(),
            repo_env: "GITHUB_REPO".into(),
            user_agent: concat!("helpdesk-assistant/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Window title and heading.
    pub title: String,
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Link shown in the Help category.  `None` hides the link.
    pub help_center_url: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Help Desk Assistant".into(),
            window_size: (640.0, 720.0),
            help_center_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// Sections missing from the file fall back to their defaults.
///
/// ```rust,no_run
/// use helpdesk_assistant::config::AppConfig;
///
/// // Writes the defaults on first run.
/// let config = AppConfig::load_or_create().unwrap();
/// assert!(!config.tracker.api_base.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language-model settings.
    pub llm: LlmConfig,
    /// STT engine settings.
    pub stt: SttConfig,
    /// Issue-tracker settings.
    pub tracker: TrackerConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load the platform-appropriate `settings.toml`.  On first run the
    /// defaults are written there so operators have a file to edit.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&AppPaths::new().settings_file)
    }

    pub fn load_or_create_at(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        config.save_to(path)?;
        log::info!("Wrote default settings to {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.llm.provider, loaded.llm.provider);
        assert_eq!(original.llm.base_url, loaded.llm.base_url);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.timeout_secs, loaded.llm.timeout_secs);
        assert_eq!(original.stt.model, loaded.stt.model);
        assert_eq!(original.stt.language, loaded.stt.language);
        assert_eq!(original.tracker.api_base, loaded.tracker.api_base);
        assert_eq!(original.tracker.token_env, loaded.tracker.token_env);
        assert_eq!(original.tracker.repo_env, loaded.tracker.repo_env);
        assert_eq!(original.ui.title, loaded.ui.title);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.tracker.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn first_run_writes_defaults_then_reads_edits() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let cfg = AppConfig::load_or_create_at(&path).expect("first run");
        assert!(path.exists());
        assert_eq!(cfg.stt.model, "whisper-base");

        let edited = "[stt]\nmodel = \"whisper-small\"\nlanguage = \"en\"\n";
        std::fs::write(&path, edited).expect("edit");
        let cfg = AppConfig::load_or_create_at(&path).expect("second run");
        assert_eq!(cfg.stt.model, "whisper-small");
        assert_eq!(cfg.stt.language, "en");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.llm.provider, LlmProvider::Ollama);
        assert_eq!(cfg.llm.base_url, "http://localhost:11434");
        assert!(cfg.llm.api_key_env.is_none());
        assert!(cfg.llm.timeout_secs.is_none());
        assert_eq!(cfg.stt.model, "whisper-base");
        assert_eq!(cfg.stt.language, "auto");
        assert_eq!(cfg.tracker.api_base, "https://api.github.com");
        assert_eq!(cfg.tracker.repo_env, "GITHUB_REPO");
        assert!(cfg.tracker.user_agent.starts_with("helpdesk-assistant/"));
        assert!(cfg.ui.help_center_url.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "OpenAiCompatible"
base_url = "https://api.openai.com"
api_key_env = "OPENAI_API_KEY"
model = "gpt-4o-mini"
temperature = 0.0
timeout_secs = 30
"#,
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.llm.provider, LlmProvider::OpenAiCompatible);
        assert_eq!(cfg.llm.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
        assert_eq!(cfg.llm.timeout_secs, Some(30));
        // Untouched sections come from Default.
        assert_eq!(cfg.tracker.api_base, "https://api.github.com");
        assert_eq!(cfg.stt.model, "whisper-base");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[llm\nmodel = ").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.llm.provider = LlmProvider::Disabled;
        cfg.llm.timeout_secs = Some(90);
        cfg.stt.language = "en".into();
        cfg.tracker.api_base = "https://github.example.com/api/v3".into();
        cfg.tracker.token_env = "SUPPORT_TOKEN".into();
        cfg.ui.help_center_url = Some("https://help.example.com".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.llm.provider, LlmProvider::Disabled);
        assert_eq!(loaded.llm.timeout_secs, Some(90));
        assert_eq!(loaded.stt.language, "en");
        assert_eq!(loaded.tracker.api_base, "https://github.example.com/api/v3");
        assert_eq!(loaded.tracker.token_env, "SUPPORT_TOKEN");
        assert_eq!(
            loaded.ui.help_center_url.as_deref(),
            Some("https://help.example.com")
        );
    }
}
