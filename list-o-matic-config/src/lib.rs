use core::fmt::{Debug, Display};
use std::net::SocketAddr;
use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "lom.toml";
pub const ENV_PREFIX: &str = "LOM_";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// The JSON snapshot holding every talking list.
    #[serde(default = "default_talking_lists_path")]
    pub talking_lists: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            talking_lists: default_talking_lists_path(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationConfig {
    /// Hex encoded SHA-256 digests of the keys that grant access to the protected routes.
    #[serde(default)]
    pub admin_key_sha256: Vec<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListsConfig {
    /// Name of the group every new talking list starts with.
    #[serde(default = "default_group_name")]
    pub default_group_name: String,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            default_group_name: default_group_name(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    #[serde(default)]
    pub lists: ListsConfig,
}

fn default_talking_lists_path() -> PathBuf {
    PathBuf::from("talking_lists.json")
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_group_name() -> String {
    "Redner".to_owned()
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// `LOM_SERVER__ADDRESS` overrides `server.address` from `lom.toml`.
#[must_use]
pub fn figment() -> Figment {
    Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
