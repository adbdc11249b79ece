//! Console configuration.
//!
//! Settings come from a YAML file, located by the `--config` flag or the
//! `WAGERDESK_CONFIG` variable (the flag wins). A missing location means
//! defaults; a location that cannot be read or parsed is an error.
//! `WAGERDESK_API_URL` overrides the file's `api_url`.
//!
//! ```yaml
//! api_url: https://admin.example.com/api
//! data_dir: ./data
//! session_file: ~/.wagerdesk/session.json
//! page_size: 25
//! output: table
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use wagerdesk_query::PageSize;

use crate::env::EnvReader;
use crate::output::OutputMode;

/// Variable naming the config file.
pub const CONFIG_ENV: &str = "WAGERDESK_CONFIG";
/// Variable overriding the remote base URL.
pub const API_URL_ENV: &str = "WAGERDESK_API_URL";

const DEFAULT_SESSION_FILE: &str = ".wagerdesk/session.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Resolved console settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the platform API.
    pub api_url: Option<String>,
    /// Directory holding `<report>.json` data files. Unset means the
    /// bundled fixtures.
    pub data_dir: Option<PathBuf>,
    /// Where the signed-in session is kept.
    pub session_file: PathBuf,
    pub page_size: PageSize,
    pub output: OutputMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: None,
            data_dir: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            page_size: PageSize::default(),
            output: OutputMode::default(),
        }
    }
}

impl AppConfig {
    /// Parses a YAML document. Absent keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(text)
    }

    /// Reads and parses the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the config: explicit path, then `WAGERDESK_CONFIG`, then
    /// defaults, with `WAGERDESK_API_URL` applied last.
    pub fn load(explicit: Option<&Path>, env: &dyn EnvReader) -> Result<Self, ConfigError> {
        let location = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.var(CONFIG_ENV).map(PathBuf::from));

        let mut config = match &location {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(path)?
            }
            None => AppConfig::default(),
        };

        if let Some(url) = env.var(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.api_url = Some(url);
        }
        Ok(config)
    }
}
