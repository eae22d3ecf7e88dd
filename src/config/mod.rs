//! Import settings and the subscription registry

mod import_config;
mod subscriptions;

use thiserror::Error;

pub use import_config::{ImportConfig, PersonalField};
pub use subscriptions::{Subscription, SubscriptionStore};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config directory not found")]
    DataDirNotFound,

    #[error("Subscription key is empty")]
    EmptyKey,

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
