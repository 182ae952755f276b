use thiserror::Error;

use crate::Level;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Icon catalogue too small, level needs {required} pairs but only {available} icons exist")]
    CatalogueExhausted { required: usize, available: usize },
    #[error("Invalid level {0}")]
    InvalidLevel(Level),
    #[error("Deck does not hold every icon exactly twice: {0}")]
    InvalidDeck(&'static str),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure reported by a persistence backend or while decoding what it returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend failure: {0}")]
    Backend(String),
    #[error("Malformed value under {key}: {reason}")]
    Malformed { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(&'static str),
}
