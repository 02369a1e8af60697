use super::*;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::{CompanyForm, CompanyId},
    signals::{SignalInput, SignalNaming, SignalSet},
};
use tokio::net::TcpListener;

use crate::{
    controller::{FormSnapshot, FormView, SubmitEvent},
    error::UNREACHABLE_MESSAGE,
};

#[derive(Clone, Default)]
struct ServerState {
    companies: Arc<Mutex<Vec<Value>>>,
    evaluations: Arc<Mutex<Vec<Value>>>,
}

async fn handle_create_company(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut companies = state.companies.lock().expect("lock");
    companies.push(payload.clone());
    let mut body = payload;
    body["id"] = json!(companies.len());
    (StatusCode::CREATED, Json(body))
}

async fn handle_list_companies(State(state): State<ServerState>) -> Json<Value> {
    let companies = state.companies.lock().expect("lock");
    let listed: Vec<Value> = companies
        .iter()
        .enumerate()
        .map(|(i, c)| json!({ "id": i + 1, "name": c["name"] }))
        .collect();
    Json(Value::Array(listed))
}

async fn handle_evaluate(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.evaluations.lock().expect("lock").push(payload);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 1,
            "company_id": 1,
            "score": 0.94,
            "badge": "excellent",
            "evidence": ["+ contact page", "+ loads fast"]
        })),
    )
}

async fn spawn_router(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_scoring_server() -> (String, ServerState) {
    let state = ServerState::default();
    let app = Router::new()
        .route(
            "/companies",
            post(handle_create_company).get(handle_list_companies),
        )
        .route("/evaluate", post(handle_evaluate))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(state.clone());
    (spawn_router(app).await, state)
}

async fn spawn_failing_server(status: StatusCode, body: &'static str, json_body: bool) -> String {
    let handler = move || async move {
        let content_type = if json_body {
            "application/json"
        } else {
            "text/plain"
        };
        (status, [("content-type", content_type)], body)
    };
    let app = Router::new()
        .route("/companies", post(handler))
        .route("/evaluate", post(handler));
    spawn_router(app).await
}

async fn closed_local_addr() -> std::net::SocketAddr {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    addr
}

fn payload(name: &str) -> CompanyPayload {
    CompanyForm {
        name: Some(name.to_string()),
        ..CompanyForm::default()
    }
    .clean()
    .expect("payload")
}

#[tokio::test]
async fn create_company_posts_json_and_returns_body() {
    let (server_url, state) = spawn_scoring_server().await;
    let backend = HttpBackend::new(server_url);

    let body = backend
        .create_company(&payload("Acme"))
        .await
        .expect("create");

    assert_eq!(body, Some(json!({ "name": "Acme", "id": 1 })));
    let received = state.companies.lock().expect("lock").clone();
    assert_eq!(received, vec![json!({ "name": "Acme" })]);
}

#[tokio::test]
async fn validation_list_becomes_readable_message() {
    let server_url = spawn_failing_server(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#,
        true,
    )
    .await;
    let backend = HttpBackend::new(server_url);

    let err = backend
        .create_company(&payload("Acme"))
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), Some(422));
    assert!(
        err.user_message().contains("name: field required"),
        "unexpected message: {}",
        err.user_message()
    );
}

#[tokio::test]
async fn plain_text_error_body_depends_on_policy() {
    let server_url =
        spawn_failing_server(StatusCode::BAD_GATEWAY, "upstream exploded", false).await;

    let rich = HttpBackend::new(server_url.clone());
    let err = rich
        .create_company(&payload("Acme"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err.user_message(),
        "The server returned an error: upstream exploded"
    );

    let basic = HttpBackend::new(server_url).with_error_normalization(ErrorNormalization::Basic);
    let err = basic
        .create_company(&payload("Acme"))
        .await
        .expect_err("must fail");
    assert_eq!(
        err.user_message(),
        "The server returned an error: 502 Bad Gateway"
    );
}

#[tokio::test]
async fn non_json_success_body_is_absent() {
    let app = Router::new().route("/companies", post(|| async { "created!" }));
    let backend = HttpBackend::new(spawn_router(app).await);

    let body = backend
        .create_company(&payload("Acme"))
        .await
        .expect("success status");
    assert_eq!(body, None);
}

#[tokio::test]
async fn unreachable_backend_is_a_connectivity_error() {
    let addr = closed_local_addr().await;

    let backend = HttpBackend::new(format!("http://{addr}"));
    let err = backend
        .create_company(&payload("Acme"))
        .await
        .expect_err("must fail");

    assert!(err.is_connectivity(), "unexpected error: {err:?}");
    assert_eq!(err.user_message(), UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn evaluate_posts_flattened_signals() {
    let (server_url, state) = spawn_scoring_server().await;
    let backend = HttpBackend::new(format!("{server_url}/"));

    let signals = SignalSet::from_inputs(
        &[
            SignalInput::new("reviews", true),
            SignalInput::new("schema_markup", false),
        ],
        SignalNaming::Translated,
    );
    backend
        .evaluate(&EvaluateRequest {
            company_id: CompanyId::Number(1),
            signals,
        })
        .await
        .expect("evaluate");

    let received = state.evaluations.lock().expect("lock").clone();
    assert_eq!(
        received,
        vec![json!({
            "company_id": 1,
            "has_reviews_or_testimonials": true,
            "uses_basic_schema_markup": false
        })]
    );
}

#[tokio::test]
async fn lists_companies_and_checks_health() {
    let (server_url, _state) = spawn_scoring_server().await;
    let backend = HttpBackend::new(server_url);
    backend
        .create_company(&payload("Acme"))
        .await
        .expect("create");

    let companies = backend.list_companies().await.expect("list");
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].id, CompanyId::Number(1));
    assert_eq!(companies[0].name, "Acme");

    let health = backend.health().await.expect("health");
    assert!(health.is_ok());
}

#[derive(Default)]
struct HeadlessForm {
    snapshot: FormSnapshot,
    label: String,
    enabled: bool,
    html: String,
}

impl FormView for HeadlessForm {
    fn read_form(&self) -> FormSnapshot {
        self.snapshot.clone()
    }

    fn submit_label(&self) -> String {
        self.label.clone()
    }

    fn set_submit_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn render_results(&mut self, view: &ResultsView) {
        self.html = view.to_html();
    }

    fn focus_name(&mut self) {}
}

#[tokio::test]
async fn controller_runs_full_workflow_over_http() {
    let (server_url, state) = spawn_scoring_server().await;
    let form = HeadlessForm {
        snapshot: FormSnapshot {
            company: CompanyForm {
                name: Some("Rocket Co".to_string()),
                city: Some(" San Francisco ".to_string()),
                industry: Some(String::new()),
                ..CompanyForm::default()
            },
            signals: vec![
                SignalInput::new("contact_page", true),
                SignalInput::new("loads_fast", true),
            ],
        },
        label: "Evaluate".to_string(),
        enabled: true,
        html: String::new(),
    };
    let mut controller =
        SubmissionController::new(HttpBackend::new(server_url), form, ControllerOptions::default());

    let outcome = controller.submit(&mut SubmitEvent::new()).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    let companies = state.companies.lock().expect("lock").clone();
    assert_eq!(
        companies,
        vec![json!({ "name": "Rocket Co", "city": "San Francisco" })]
    );
    let evaluations = state.evaluations.lock().expect("lock").clone();
    assert_eq!(
        evaluations,
        vec![json!({
            "company_id": 1,
            "has_contact_page": true,
            "has_fast_load_time_claim": true
        })]
    );

    let view = controller.view();
    assert!(view.enabled);
    assert_eq!(view.label, "Evaluate");
    assert!(view.html.contains(">0.94<"));
    assert!(view.html.contains(">excellent<"));
    assert!(view.html.contains("<li>+ contact page</li>"));
}

#[tokio::test]
async fn controller_reports_unreachable_backend() {
    let addr = closed_local_addr().await;

    let form = HeadlessForm {
        snapshot: FormSnapshot {
            company: CompanyForm {
                name: Some("Acme".to_string()),
                ..CompanyForm::default()
            },
            signals: Vec::new(),
        },
        label: "Evaluate".to_string(),
        enabled: true,
        html: String::new(),
    };
    let mut controller = SubmissionController::new(
        HttpBackend::new(format!("http://{addr}")),
        form,
        ControllerOptions::default(),
    );

    controller.submit(&mut SubmitEvent::new()).await;

    let view = controller.view();
    assert!(view.enabled);
    assert_eq!(view.label, "Evaluate");
    assert_eq!(
        view.html,
        format!("<p class=\"status status-error\">{UNREACHABLE_MESSAGE}</p>")
    );
}
