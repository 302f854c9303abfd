//! Configuration module for the help-desk assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, TOML persistence via
//! `AppConfig::load_or_create`, and `TrackerCredentials` resolved
//! from the environment at startup.

pub mod credentials;
pub mod paths;
pub mod settings;

pub use credentials::{ConfigError, RepoSlug, TrackerCredentials};
pub use paths::AppPaths;
pub use settings::{AppConfig, LlmConfig, LlmProvider, SttConfig, TrackerConfig, UiConfig};
