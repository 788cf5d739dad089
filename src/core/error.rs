use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomesteadError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(crate::core::types::UnitId),

    #[error("City not found: {0:?}")]
    CityNotFound(crate::core::types::CityId),

    #[error("Illegal settlement site at ({x}, {y}): {reason}")]
    IllegalSite { x: i32, y: i32, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HomesteadError>;
