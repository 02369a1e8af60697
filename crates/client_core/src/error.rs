use thiserror::Error;

pub const UNREACHABLE_MESSAGE: &str = "Could not reach the backend. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),
    #[error("could not reach {endpoint}: {source}")]
    Connectivity {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{message}")]
    Application { status: u16, message: String },
    #[error("{0}")]
    ContractViolation(String),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Connectivity { .. } => UNREACHABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid api base '{value}': {reason}")]
    InvalidApiBase { value: String, reason: String },
    #[error(transparent)]
    SignalNaming(#[from] shared::signals::UnknownSignalNaming),
    #[error(transparent)]
    ErrorDetail(#[from] shared::error::UnknownErrorNormalization),
    #[error("invalid boolean '{value}' for {key}")]
    InvalidBool { key: String, value: String },
}
