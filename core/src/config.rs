//! Run configuration, loaded once from the environment and validated before
//! anything touches the network.

use crate::throttle::Throttle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CLIENT_ID_VAR: &str = "RSPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "RSPOTIFY_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "RSPOTIFY_REDIRECT_URI";
pub const SOURCE_CACHE_VAR: &str = "TRANSFER_SOURCE_CACHE";
pub const DESTINATION_CACHE_VAR: &str = "TRANSFER_DESTINATION_CACHE";
pub const DELAY_VAR: &str = "TRANSFER_DELAY_MS";

pub const DEFAULT_SOURCE_CACHE: &str = ".cache-source";
pub const DEFAULT_DESTINATION_CACHE: &str = ".cache-destination";

/// Everything both sessions need: reading and writing the library, playlists
/// and follows.
pub const SCOPES: &str = "user-library-read user-library-modify playlist-read-private \
playlist-read-collaborative playlist-modify-public playlist-modify-private \
user-follow-read user-follow-modify";

const PLACEHOLDERS: &[&str] = &["YOUR_CLIENT_ID", "YOUR_CLIENT_SECRET", "YOUR REDIRECT URI"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}. Set it in the environment or in a .env file.")]
    Missing(&'static str),
    #[error("{0} still holds a placeholder value. Fill in your app credentials.")]
    Placeholder(&'static str),
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Which side of the transfer a session acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Source,
    Destination,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Source => write!(f, "source"),
            AccountRole::Destination => write!(f, "destination"),
        }
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "src" => Ok(AccountRole::Source),
            "destination" | "dest" | "dst" => Ok(AccountRole::Destination),
            other => Err(format!(
                "unknown account role '{other}' (expected 'source' or 'destination')"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub source_cache: PathBuf,
    pub destination_cache: PathBuf,
    pub throttle: Throttle,
}

impl TransferConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let throttle = match lookup(DELAY_VAR) {
            None => Throttle::default(),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Throttle::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    var: DELAY_VAR,
                    value: raw.clone(),
                })?,
        };

        let config = Self {
            client_id: required(CLIENT_ID_VAR)?,
            client_secret: required(CLIENT_SECRET_VAR)?,
            redirect_uri: required(REDIRECT_URI_VAR)?,
            scopes: SCOPES.to_string(),
            source_cache: lookup(SOURCE_CACHE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_CACHE)),
            destination_cache: lookup(DESTINATION_CACHE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION_CACHE)),
            throttle,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, value) in [
            (CLIENT_ID_VAR, &self.client_id),
            (CLIENT_SECRET_VAR, &self.client_secret),
            (REDIRECT_URI_VAR, &self.redirect_uri),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Missing(var));
            }
            if PLACEHOLDERS.contains(&value.as_str()) {
                return Err(ConfigError::Placeholder(var));
            }
        }
        if !self.redirect_uri.contains("://") {
            return Err(ConfigError::Invalid {
                var: REDIRECT_URI_VAR,
                value: self.redirect_uri.clone(),
            });
        }
        Ok(())
    }

    pub fn cache_path(&self, role: AccountRole) -> &Path {
        match role {
            AccountRole::Source => &self.source_cache,
            AccountRole::Destination => &self.destination_cache,
        }
    }
}
