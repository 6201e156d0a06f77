// src/error.rs

/// Failure raised by a single provider's fetch.
///
/// These never leave the aggregation core: the isolation wrapper turns every
/// one of them into an empty contribution plus a warning.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ProviderError::Http(_) => "upstream_error",
            ProviderError::Upstream(_) => "upstream_error",
            ProviderError::Parse(_) => "parse_error",
            ProviderError::SerdeJson(_) => "parse_error",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Other(_) => "internal_error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Provider '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("persist error: {0}")]
    Persist(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
