use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const FAILURE_PREFIX: &str = "The server returned an error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorNormalization {
    Basic,
    #[default]
    Rich,
}

#[derive(Debug, Error)]
#[error("unknown error detail policy '{0}' (expected 'basic' or 'rich')")]
pub struct UnknownErrorNormalization(pub String);

impl FromStr for ErrorNormalization {
    type Err = UnknownErrorNormalization;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "rich" => Ok(Self::Rich),
            other => Err(UnknownErrorNormalization(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(msg) => Some(Self {
                loc: Vec::new(),
                msg: msg.clone(),
            }),
            Value::Object(obj) => {
                let msg = obj
                    .get("msg")
                    .or_else(|| obj.get("message"))
                    .and_then(Value::as_str)?
                    .to_string();
                let loc = obj
                    .get("loc")
                    .and_then(Value::as_array)
                    .map(|segments| {
                        segments
                            .iter()
                            .filter_map(|segment| match segment {
                                Value::String(s) => Some(s.clone()),
                                Value::Number(n) => Some(n.to_string()),
                                _ => None,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Self { loc, msg })
            }
            _ => None,
        }
    }

    // The request-body prefix is left off the path.
    pub fn display(&self) -> String {
        let path: Vec<&str> = self
            .loc
            .iter()
            .map(String::as_str)
            .skip_while(|segment| *segment == "body")
            .collect();
        if path.is_empty() {
            self.msg.clone()
        } else {
            format!("{}: {}", path.join("."), self.msg)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    PlainMessage(String),
    StructuredMessage { message: String },
    ValidationErrorList(Vec<FieldError>),
}

impl ErrorDetail {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::PlainMessage(s.clone())),
            Value::Object(obj) => obj
                .get("message")
                .or_else(|| obj.get("msg"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map(|m| Self::StructuredMessage {
                    message: m.to_string(),
                }),
            Value::Array(items) => {
                let errors: Vec<FieldError> =
                    items.iter().filter_map(FieldError::from_value).collect();
                if errors.is_empty() {
                    None
                } else {
                    Some(Self::ValidationErrorList(errors))
                }
            }
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::PlainMessage(message) | Self::StructuredMessage { message } => message.clone(),
            Self::ValidationErrorList(errors) => errors
                .iter()
                .map(FieldError::display)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FailureResponse<'a> {
    pub status: u16,
    pub reason: Option<&'a str>,
    pub body: Option<&'a Value>,
    pub raw_text: &'a str,
}

impl FailureResponse<'_> {
    fn status_line(&self) -> String {
        match self.reason {
            Some(reason) if !reason.is_empty() => format!("{} {reason}", self.status),
            _ => format!("status {}", self.status),
        }
    }

    fn detail(&self, policy: ErrorNormalization) -> String {
        let body = self.body;
        let field = |name: &str| body.and_then(|b| b.get(name));
        let non_blank_str = |value: Option<&Value>| {
            value
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let from_fields = match policy {
            ErrorNormalization::Basic => {
                non_blank_str(field("detail")).or_else(|| non_blank_str(field("message")))
            }
            ErrorNormalization::Rich => field("detail")
                .and_then(ErrorDetail::from_value)
                .or_else(|| field("message").and_then(ErrorDetail::from_value))
                .map(|detail| detail.display()),
        };
        if let Some(detail) = from_fields {
            return detail;
        }

        if let Some(text) = non_blank_str(body) {
            return text;
        }

        if policy == ErrorNormalization::Rich && body.is_none() {
            let raw = self.raw_text.trim();
            if !raw.is_empty() {
                return raw.to_string();
            }
        }

        self.status_line()
    }
}

pub fn describe_failure(response: &FailureResponse<'_>, policy: ErrorNormalization) -> String {
    format!("{FAILURE_PREFIX}{}", response.detail(policy))
}
