//! Environment-sourced configuration.
//!
//! Nothing in the library reads the environment on its own; `Config` is
//! built once at the edge and handed to `ShipStation::new`.

use crate::error::{Result, WarehouseError};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://ssapi.shipstation.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_API_KEY: &str = "SHIPSTATION_API_KEY";
const ENV_API_SECRET: &str = "SHIPSTATION_API_SECRET";
const ENV_API_BASE: &str = "SHIPSTATION_API_BASE";
const ENV_TIMEOUT: &str = "SHIPSTATION_TIMEOUT_SECS";

/// API key/secret pair used for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    /// Both halves must be non-empty
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let secret = secret.into();
        if key.trim().is_empty() || secret.trim().is_empty() {
            return None;
        }
        Some(Credentials { key, secret })
    }
}

// Keep the secret out of logs and panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when the environment does not provide both halves
    pub credentials: Option<Credentials>,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credentials: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn with_credentials(credentials: Credentials) -> Self {
        Config {
            credentials: Some(credentials),
            ..Config::default()
        }
    }

    /// Build a config from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match (lookup(ENV_API_KEY), lookup(ENV_API_SECRET)) {
            (Some(key), Some(secret)) => Credentials::new(key, secret),
            _ => None,
        };

        let api_base = lookup(ENV_API_BASE)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout = match lookup(ENV_TIMEOUT) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    WarehouseError::Config(format!("{ENV_TIMEOUT} must be whole seconds, got '{raw}'"))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            credentials,
            api_base,
            timeout,
        })
    }
}

/// Load `.env` from `dir`, falling back to `dir/config/.env`.
///
/// Variables already set in the process win over file contents. Returns the
/// file that was loaded, if any.
pub fn load_dotenv(dir: &Path) -> Option<std::path::PathBuf> {
    let candidates = [dir.join(".env"), dir.join("config").join(".env")];
    for path in candidates {
        if path.is_file() {
            match dotenvy::from_path(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "loaded environment file");
                    return Some(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load environment file");
                }
            }
        }
    }
    None
}
