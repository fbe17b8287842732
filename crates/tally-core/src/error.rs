//! Error types for Tally

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No PDF backend available: {0}")]
    BackendUnavailable(String),

    #[error("Rules configuration not found: {}", .0.display())]
    ConfigurationNotFound(PathBuf),

    #[error("Invalid rules configuration: {0}")]
    InvalidConfig(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
