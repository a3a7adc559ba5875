//! Alpaca credential loading.
//!
//! Credentials live in a small JSON file (by default `config.json` in the
//! working directory):
//!
//! ```json
//! { "ALPACA_KEY": "PK...", "ALPACA_SECRET": "..." }
//! ```
//!
//! When no file is given and the default file does not exist, the standard
//! Alpaca environment variables (`APCA_API_KEY_ID`, `APCA_API_SECRET_KEY`)
//! are used instead.

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::env::{APCA_API_KEY_ID, APCA_API_SECRET_KEY, MissingEnvVarError, get_env_var};

/// Default credentials file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The credentials file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The credentials file is not valid JSON or has the wrong shape.
    #[error("Malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required key is absent or empty.
    #[error("Config file {path} is missing `{key}`")]
    MissingKey { path: PathBuf, key: &'static str },

    /// An environment variable required by the application is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),
}

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(rename = "ALPACA_KEY")]
    key: Option<String>,
    #[serde(rename = "ALPACA_SECRET")]
    secret: Option<String>,
}

/// An Alpaca key id / secret pair.
#[derive(Clone)]
pub struct Credentials {
    key_id: SecretString,
    secret_key: SecretString,
}

impl Credentials {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: SecretString::from(key_id.into()),
            secret_key: SecretString::from(secret_key.into()),
        }
    }

    pub fn key_id(&self) -> &SecretString {
        &self.key_id
    }

    pub fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }

    /// Reads credentials from a JSON file with `ALPACA_KEY` and `ALPACA_SECRET`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    fn from_json_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let parsed: RawCredentials =
            serde_json::from_str(raw).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let key = non_empty(parsed.key).ok_or_else(|| ConfigError::MissingKey {
            path: path.to_path_buf(),
            key: "ALPACA_KEY",
        })?;
        let secret = non_empty(parsed.secret).ok_or_else(|| ConfigError::MissingKey {
            path: path.to_path_buf(),
            key: "ALPACA_SECRET",
        })?;

        Ok(Self::new(key, secret))
    }

    /// Reads credentials from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = get_env_var(APCA_API_KEY_ID)?;
        let secret = get_env_var(APCA_API_SECRET_KEY)?;
        Ok(Self::new(key, secret))
    }

    /// Resolves credentials for a run.
    ///
    /// An explicit path must exist. Without one, `config.json` in the working
    /// directory is tried first and the environment second.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            tracing::debug!(path = %default.display(), "loading credentials from file");
            Self::from_file(default)
        } else {
            tracing::debug!("no config.json found, reading credentials from environment");
            Self::from_env()
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key_id.expose_secret();
        let shown = key.get(..4).unwrap_or("");
        f.debug_struct("Credentials")
            .field("key_id", &format_args!("{shown}***"))
            .field("secret_key", &"***")
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
