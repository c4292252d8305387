//! Engine configuration loaded from the environment.
//!
//! Variables (all optional):
//! - `STORYLOOM_LOG` - tracing filter directive, default `storyloom_engine=info`
//! - `STORYLOOM_MAX_TURNS` - turn budget for replayed sessions, default 30
//! - `STORYLOOM_MAX_INTEGRITY` - starting and maximum integrity, default 100
//! - `STORYLOOM_TRANSCRIPT` - transcript path used when none is passed on the command line
//!
//! `RUST_LOG` takes precedence over `STORYLOOM_LOG` when both are set.

use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "storyloom_engine=info";
pub const DEFAULT_MAX_TURNS: u32 = 30;
pub const DEFAULT_MAX_INTEGRITY: i64 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub log_filter: String,
    pub max_turns: u32,
    pub max_integrity: i64,
    pub transcript_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            max_integrity: DEFAULT_MAX_INTEGRITY,
            transcript_path: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(filter) = read("RUST_LOG").or_else(|| read("STORYLOOM_LOG")) {
            config.log_filter = filter;
        }

        if let Some(raw) = read("STORYLOOM_MAX_TURNS") {
            let max_turns: u32 = raw
                .parse()
                .map_err(|e| ConfigError::invalid("STORYLOOM_MAX_TURNS", &raw, format!("{}", e)))?;
            if max_turns == 0 {
                return Err(ConfigError::invalid(
                    "STORYLOOM_MAX_TURNS",
                    &raw,
                    "must be at least 1",
                ));
            }
            config.max_turns = max_turns;
        }

        if let Some(raw) = read("STORYLOOM_MAX_INTEGRITY") {
            let max_integrity: i64 = raw.parse().map_err(|e| {
                ConfigError::invalid("STORYLOOM_MAX_INTEGRITY", &raw, format!("{}", e))
            })?;
            if max_integrity <= 0 {
                return Err(ConfigError::invalid(
                    "STORYLOOM_MAX_INTEGRITY",
                    &raw,
                    "must be positive",
                ));
            }
            config.max_integrity = max_integrity;
        }

        config.transcript_path = read("STORYLOOM_TRANSCRIPT").map(PathBuf::from);

        Ok(config)
    }
}

/// Load `.env.local` then `.env` from the workspace root, if present.
///
/// Existing process variables are never overridden.
pub fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
