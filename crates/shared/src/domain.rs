use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompanyId {
    Number(i64),
    Text(String),
}

impl CompanyId {
    // Integral floats such as `5.0` count as the integer they spell.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral_f64))
                .map(Self::Number),
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

fn integral_f64(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub fn clean_field(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyForm {
    pub name: Option<String>,
    pub website: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub niche: Option<String>,
}

impl CompanyForm {
    pub fn clean(&self) -> Option<CompanyPayload> {
        let name = clean_field(self.name.as_deref())?;
        Some(CompanyPayload {
            name,
            website: clean_field(self.website.as_deref()),
            country: clean_field(self.country.as_deref()),
            state: clean_field(self.state.as_deref()),
            city: clean_field(self.city.as_deref()),
            industry: clean_field(self.industry.as_deref()),
            niche: clean_field(self.niche.as_deref()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl CompanySummary {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}
