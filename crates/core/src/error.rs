/// Opaque error reported by a [`crate::PolicyDirectoryClient`] implementation.
pub type DirectoryError = Box<dyn std::error::Error + Send + Sync>;

/// Per-request failures of a consent status evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("check policy '{check_policy}' not found for domain '{domain}'")]
    MissingCheckPolicy {
        domain: String,
        check_policy: String,
    },
    #[error("malformed provision: {0}")]
    MalformedProvision(String),
    #[error("policy directory unavailable: {0}")]
    DirectoryUnavailable(#[source] DirectoryError),
}

pub type ConsentResult<T> = std::result::Result<T, ConsentError>;

/// Reasons a single directory record is left out of the domain snapshot.
///
/// These never fail a refresh; the record is skipped and the batch continues.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryRecordError {
    #[error("record is not active")]
    Inactive,
    #[error("record has no identifier value")]
    MissingName,
    #[error("record has no person identifier system")]
    MissingPersonIdSystem,
    #[error("record has no check policy")]
    MissingCheckPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read config file {path}: {source}", path = path.display())]
    FileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("invalid duration '{value}': {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
