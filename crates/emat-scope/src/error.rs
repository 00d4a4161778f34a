use std::path::PathBuf;

use thiserror::Error;

use crate::parameter::DType;

/// A scope document that is not well formed.
///
/// Every variant names the offending location as a dotted path into the
/// document (e.g. `inputs.alpha.max`).
#[derive(Debug, Error)]
pub enum ScopeFormatError {
    #[error("invalid scope YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{path}: missing required key `{key}`")]
    MissingKey { path: String, key: String },

    #[error("{path}: expected {expected}")]
    InvalidType { path: String, expected: &'static str },

    #[error("{path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("duplicate name `{name}` in {section}")]
    DuplicateName { section: String, name: String },

    #[error("{path}: {value} is outside [{min}, {max}]")]
    OutOfRange {
        path: String,
        value: String,
        min: String,
        max: String,
    },
}

impl ScopeFormatError {
    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingKey {
            path: path.into(),
            key: key.into(),
        }
    }

    pub(crate) fn wrong_type(path: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidType {
            path: path.into(),
            expected,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error(transparent)]
    Format(#[from] ScopeFormatError),

    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing file `{0}`")]
    FileExists(PathBuf),

    #[error("failed to serialize scope: {0}")]
    Serialize(serde_yaml::Error),

    #[error("`{0}` is not a parameter or measure in this scope")]
    UnknownName(String),

    #[error("cannot coerce {value} to {dtype} for `{name}`")]
    Coerce {
        name: String,
        value: String,
        dtype: DType,
    },
}
