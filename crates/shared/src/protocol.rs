use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::CompanyId,
    signals::{SignalSet, COMPANY_ID_KEY},
};

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest {
    pub company_id: CompanyId,
    #[serde(flatten)]
    pub signals: SignalSet,
}

pub fn extract_company_id(body: Option<&Value>) -> Option<CompanyId> {
    let body = body?;
    body.get(COMPANY_ID_KEY)
        .and_then(CompanyId::from_value)
        .or_else(|| body.get("id").and_then(CompanyId::from_value))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    Single(Value),
    Many(Vec<Value>),
}

impl Evidence {
    // A blank single entry counts as no evidence at all.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Many(items) => items.iter().map(display_value).collect(),
            Self::Single(item) if is_blank(item) => Vec::new(),
            Self::Single(item) => vec![display_value(item)],
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResult {
    pub score: Option<f64>,
    pub badge: Option<String>,
    pub evidence: Option<Evidence>,
}

impl EvaluationResult {
    pub fn from_body(body: Option<&Value>) -> Self {
        let Some(body) = body else {
            return Self::default();
        };

        let score = body.get("score").and_then(Value::as_f64);
        let badge = body
            .get("badge")
            .and_then(Value::as_str)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        let evidence = match body.get("evidence") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(Evidence::Many(items.clone())),
            Some(other) => Some(Evidence::Single(other.clone())),
        };

        Self {
            score,
            badge,
            evidence,
        }
    }

    pub fn evidence_items(&self) -> Vec<String> {
        self.evidence
            .as_ref()
            .map(Evidence::items)
            .unwrap_or_default()
    }
}
