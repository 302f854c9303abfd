//! Issue-tracker credentials resolved from the environment at startup.
//!
//! The environment (optionally primed from a `.env` file by `main`) is the
//! only place the token and repository are read from.  A missing or malformed
//! value is a [`ConfigError`] and the application refuses to start.

use std::fmt;

use thiserror::Error;

use super::TrackerConfig;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Startup configuration problems that must be fixed by the operator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("environment variable {var} is not set; export it or add it to a .env file")]
    MissingEnv { var: String },

    /// The repository variable is not of the form `owner/name`.
    #[error("environment variable {var} must look like \"owner/name\", got {value:?}")]
    InvalidRepo { var: String, value: String },
}

// ---------------------------------------------------------------------------
// RepoSlug
// ---------------------------------------------------------------------------

/// A repository identifier split into owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse `"owner/name"`.  Both halves must be non-empty and free of
    /// whitespace or further slashes.
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.trim().split_once('/')?;
        let valid = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !valid(owner) || !valid(name) {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// TrackerCredentials
// ---------------------------------------------------------------------------

/// Validated credential + repository for the issue tracker.
#[derive(Clone)]
pub struct TrackerCredentials {
    pub token: String,
    pub repo: RepoSlug,
}

impl fmt::Debug for TrackerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerCredentials")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .finish()
    }
}

impl TrackerCredentials {
    /// Read the variables named in `config` from the process environment.
    pub fn from_env(config: &TrackerConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary lookup function (tests pass a map here so
    /// the process environment is left alone).
    pub fn from_lookup<F>(config: &TrackerConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv {
                    var: var.to_string(),
                })
        };

        let token = required(&config.token_env)?;
        let raw_repo = required(&config.repo_env)?;
        let repo = RepoSlug::parse(&raw_repo).ok_or_else(|| ConfigError::InvalidRepo {
            var: config.repo_env.clone(),
            value: raw_repo.clone(),
        })?;

        Ok(Self { token, repo })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn resolves_token_and_repo() {
        let cfg = TrackerConfig::default();
        let creds = TrackerCredentials::from_lookup(
            &cfg,
            lookup(&[("GITHUB_TOKEN", "ghp_abc"), ("GITHUB_REPO", "acme/support")]),
        )
        .expect("should resolve");

        assert_eq!(creds.token, "ghp_abc");
        assert_eq!(creds.repo.owner, "acme");
        assert_eq!(creds.repo.name, "support");
    }

    #[test]
    fn missing_token_names_the_variable() {
        let cfg = TrackerConfig::default();
        let err = TrackerCredentials::from_lookup(&cfg, lookup(&[("GITHUB_REPO", "acme/support")]))
            .expect_err("token is missing");

        assert_eq!(
            err,
            ConfigError::MissingEnv {
                var: "GITHUB_TOKEN".into()
            }
        );
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn missing_repo_names_the_variable() {
        let cfg = TrackerConfig::default();
        let err = TrackerCredentials::from_lookup(&cfg, lookup(&[("GITHUB_TOKEN", "ghp_abc")]))
            .expect_err("repo is missing");

        assert!(err.to_string().contains("GITHUB_REPO"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let cfg = TrackerConfig::default();
        let err = TrackerCredentials::from_lookup(
            &cfg,
            lookup(&[("GITHUB_TOKEN", "   "), ("GITHUB_REPO", "acme/support")]),
        )
        .expect_err("blank token");

        assert!(matches!(err, ConfigError::MissingEnv { .. }));
    }

    #[test]
    fn malformed_repo_is_rejected() {
        let cfg = TrackerConfig::default();
        for bad in ["acme", "/support", "acme/", "acme/support/extra", "ac me/support"] {
            let err = TrackerCredentials::from_lookup(
                &cfg,
                lookup(&[("GITHUB_TOKEN", "ghp_abc"), ("GITHUB_REPO", bad)]),
            )
            .expect_err("malformed repo");
            assert!(
                matches!(err, ConfigError::InvalidRepo { .. }),
                "expected InvalidRepo for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn custom_variable_names_are_honoured() {
        let cfg = TrackerConfig {
            token_env: "SUPPORT_TOKEN".into(),
            repo_env: "SUPPORT_REPO".into(),
            ..TrackerConfig::default()
        };
        let creds = TrackerCredentials::from_lookup(
            &cfg,
            lookup(&[("SUPPORT_TOKEN", "t"), ("SUPPORT_REPO", "org/desk")]),
        )
        .expect("should resolve");

        assert_eq!(creds.repo.to_string(), "org/desk");
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = TrackerCredentials {
            token: "ghp_secret".into(),
            repo: RepoSlug::parse("acme/support").expect("valid"),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert!(dbg.contains("redacted"));
    }
}
