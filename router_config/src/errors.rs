use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RouterConfigError {
    #[error("router config file not found")]
    ConfigNotFound,
    #[error("[router] section missing from config file")]
    ConfigSectionNotFound,
    #[error("failed to read environment variable {0}")]
    EnvVarError(String),
    #[error("Config Error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for RouterConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}
