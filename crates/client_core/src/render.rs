//! What the results area shows, as HTML fragments or terminal text.

use shared::protocol::EvaluationResult;

pub const IN_PROGRESS_MESSAGE: &str = "Evaluating…";
pub const DEFAULT_BADGE: &str = "Not awarded";
pub const MISSING_SCORE: &str = "—";
pub const NO_EVIDENCE_MESSAGE: &str = "No evidence returned by the evaluator.";

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    Status { message: String, is_error: bool },
    Evaluation(EvaluationResult),
}

impl ResultsView {
    pub fn in_progress() -> Self {
        Self::Status {
            message: IN_PROGRESS_MESSAGE.to_string(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            is_error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Status { is_error: true, .. })
    }

    pub fn to_html(&self) -> String {
        match self {
            Self::Status { message, is_error } => {
                let class = if *is_error {
                    "status status-error"
                } else {
                    "status"
                };
                format!("<p class=\"{class}\">{}</p>", escape_html(message))
            }
            Self::Evaluation(result) => evaluation_html(result),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Status { message, is_error: true } => format!("error: {message}"),
            Self::Status { message, .. } => message.clone(),
            Self::Evaluation(result) => evaluation_text(result),
        }
    }
}

fn score_label(result: &EvaluationResult) -> String {
    result
        .score
        .map(|score| score.to_string())
        .unwrap_or_else(|| MISSING_SCORE.to_string())
}

fn badge_label(result: &EvaluationResult) -> &str {
    result.badge.as_deref().unwrap_or(DEFAULT_BADGE)
}

fn evaluation_html(result: &EvaluationResult) -> String {
    let items = result.evidence_items();
    let evidence = if items.is_empty() {
        format!("<p class=\"muted\">{}</p>", escape_html(NO_EVIDENCE_MESSAGE))
    } else {
        let list: String = items
            .iter()
            .map(|item| format!("<li>{}</li>", escape_html(item)))
            .collect();
        format!("<ul class=\"evidence-list\">{list}</ul>")
    };

    format!(
        concat!(
            "<div class=\"result-grid\">",
            "<div><p class=\"result-label\">Score</p><p class=\"result-value\">{score}</p></div>",
            "<div><p class=\"result-label\">Badge</p><p class=\"result-value\">{badge}</p></div>",
            "</div>",
            "<div class=\"result-evidence\"><p class=\"result-label\">Evidence</p>{evidence}</div>"
        ),
        score = escape_html(&score_label(result)),
        badge = escape_html(badge_label(result)),
        evidence = evidence,
    )
}

fn evaluation_text(result: &EvaluationResult) -> String {
    let mut out = format!(
        "Score: {}\nBadge: {}\nEvidence:",
        score_label(result),
        badge_label(result)
    );
    let items = result.evidence_items();
    if items.is_empty() {
        out.push_str(&format!("\n  {NO_EVIDENCE_MESSAGE}"));
    }
    for item in items {
        out.push_str(&format!("\n  - {item}"));
    }
    out
}
