use thiserror::Error;

use crate::domain::ProductId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures talking to the remote cart API, kept distinguishable so the
/// store can tell transport problems from server rejections.
#[derive(Error, Debug)]
pub enum RemoteCartError {
    #[error("cart request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("cart endpoint returned status {status}")]
    Status { status: u16 },

    #[error("failed to decode cart response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remote(#[from] RemoteCartError),

    #[error("line for product {product_id} has no variant id for remote persistence")]
    MissingVariant { product_id: ProductId },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Remote(RemoteCartError::Decode(err))
        } else if let Some(status) = err.status() {
            Error::Remote(RemoteCartError::Status {
                status: status.as_u16(),
            })
        } else {
            Error::Remote(RemoteCartError::Transport(err))
        }
    }
}
