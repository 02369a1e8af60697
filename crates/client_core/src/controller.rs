//! Form submission workflow: validate, create the company, evaluate it,
//! render the outcome.

use shared::{
    domain::{CompanyForm, CompanyId, CompanyPayload},
    protocol::{extract_company_id, EvaluateRequest, EvaluationResult},
    signals::{SignalInput, SignalNaming, SignalSet},
};
use tracing::info;

use crate::{config::Settings, error::SubmitError, render::ResultsView, ScoringBackend};

pub const MISSING_NAME_MESSAGE: &str = "Please provide a company name before evaluating.";
pub const MISSING_COMPANY_ID_MESSAGE: &str = "The backend did not return a company_id.";
pub const IN_PROGRESS_LABEL: &str = "Evaluating…";

#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub company: CompanyForm,
    pub signals: Vec<SignalInput>,
}

pub trait FormView {
    fn read_form(&self) -> FormSnapshot;
    fn submit_label(&self) -> String;
    fn set_submit_label(&mut self, label: &str);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn render_results(&mut self, view: &ResultsView);
    fn focus_name(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub signal_naming: SignalNaming,
    pub reuse_existing_company: bool,
}

impl From<&Settings> for ControllerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            signal_naming: settings.signal_naming,
            reuse_existing_company: settings.reuse_existing_company,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Invalid,
    Failed(SubmitError),
    Evaluated(EvaluationResult),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Evaluated(_))
    }
}

// Keeps the submit control disabled until released or dropped.
struct SubmitLock<'a, V: FormView> {
    view: &'a mut V,
    original_label: String,
    released: bool,
}

impl<'a, V: FormView> SubmitLock<'a, V> {
    fn acquire(view: &'a mut V) -> Self {
        let original_label = view.submit_label();
        view.set_submit_enabled(false);
        view.set_submit_label(IN_PROGRESS_LABEL);
        Self {
            view,
            original_label,
            released: false,
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.view.set_submit_enabled(true);
        self.view.set_submit_label(&self.original_label);
        self.released = true;
    }
}

impl<V: FormView> Drop for SubmitLock<'_, V> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct SubmissionController<B: ScoringBackend, V: FormView> {
    backend: B,
    view: V,
    options: ControllerOptions,
}

impl<B: ScoringBackend, V: FormView> SubmissionController<B, V> {
    pub fn new(backend: B, view: V, options: ControllerOptions) -> Self {
        Self {
            backend,
            view,
            options,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn submit(&mut self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();

        let Self {
            backend,
            view,
            options,
        } = self;
        let mut lock = SubmitLock::acquire(view);
        lock.view.render_results(&ResultsView::in_progress());

        let snapshot = lock.view.read_form();
        let Some(company) = snapshot.company.clean() else {
            lock.view.render_results(&ResultsView::error(MISSING_NAME_MESSAGE));
            lock.release();
            lock.view.focus_name();
            return SubmitOutcome::Invalid;
        };
        let signals = SignalSet::from_inputs(&snapshot.signals, options.signal_naming);

        match evaluate_company(backend, *options, company, signals).await {
            Ok(result) => {
                lock.view
                    .render_results(&ResultsView::Evaluation(result.clone()));
                SubmitOutcome::Evaluated(result)
            }
            Err(err) => {
                info!(error = %err, "submission failed");
                lock.view.render_results(&ResultsView::error(err.user_message()));
                SubmitOutcome::Failed(err)
            }
        }
    }
}

async fn evaluate_company<B: ScoringBackend>(
    backend: &B,
    options: ControllerOptions,
    company: CompanyPayload,
    signals: SignalSet,
) -> Result<EvaluationResult, SubmitError> {
    let company_id = find_or_create_company(backend, options, &company).await?;

    let body = backend
        .evaluate(&EvaluateRequest {
            company_id: company_id.clone(),
            signals,
        })
        .await?;
    let result = EvaluationResult::from_body(body.as_ref());
    info!(%company_id, score = ?result.score, badge = ?result.badge, "company evaluated");
    Ok(result)
}

async fn find_or_create_company<B: ScoringBackend>(
    backend: &B,
    options: ControllerOptions,
    company: &CompanyPayload,
) -> Result<CompanyId, SubmitError> {
    if options.reuse_existing_company {
        let existing = backend.list_companies().await?;
        if let Some(found) = existing.into_iter().find(|c| c.matches_name(&company.name)) {
            info!(company_id = %found.id, name = %found.name, "reusing existing company");
            return Ok(found.id);
        }
    }

    let body = backend.create_company(company).await?;
    let company_id = extract_company_id(body.as_ref())
        .ok_or_else(|| SubmitError::ContractViolation(MISSING_COMPANY_ID_MESSAGE.to_string()))?;
    info!(%company_id, "company created");
    Ok(company_id)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
