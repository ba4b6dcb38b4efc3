mod cancel;

pub use cancel::{CancelToken, Supersession, Ticket};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::core::{
    PlanError, ProjectionReport, RetirementPlan, Scenario, SolveRequest, SolveResult,
    SolveTarget, compare_scenarios, compute_projections, retire_earlier_age, solve_request,
};
use crate::store::{PlanStore, StoreError, load_current_plan, save_current_plan};

/// Header carrying the caller's client key for request supersession.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PlanStore>,
    requests: Supersession,
}

impl AppState {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self {
            store,
            requests: Supersession::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Request was superseded by a newer one")]
    Superseded,
    #[error("Computation failed: {0}")]
    Worker(#[from] JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Payload(_) | ApiError::Plan(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Superseded => StatusCode::CONFLICT,
            ApiError::Store(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        error_response(status, &self.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ScenariosPayload {
    plan: RetirementPlan,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/projections", post(projections_handler))
        .route("/api/solve", post(solve_handler))
        .route("/api/scenarios", post(scenarios_handler))
        .route("/api/plan", post(save_plan_handler).get(load_plan_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, store: Arc<dyn PlanStore>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::new(store));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "nestegg HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projections_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let plan: RetirementPlan = serde_json::from_slice(&body)?;
    plan.validate()?;

    let ticket = begin_request(&state, &headers, "projections");
    let token = ticket.as_ref().map(|t| t.token().clone());
    let report: Option<ProjectionReport> = tokio::task::spawn_blocking(move || {
        if token.as_ref().is_some_and(CancelToken::is_cancelled) {
            return None;
        }
        Some(compute_projections(&plan))
    })
    .await?;

    let report = report.ok_or(ApiError::Superseded)?;
    deliver(ticket.as_ref(), report)
}

async fn solve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SolveRequest = serde_json::from_slice(&body)?;
    request.plan.validate()?;
    if !request.target_value.is_finite() {
        return Err(ApiError::BadRequest(
            "targetValue must be a finite number".to_string(),
        ));
    }

    if request.target == SolveTarget::RetireEarlier
        && retire_earlier_age(&request.plan, request.target_value).is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "targetValue must be an age between currentAge ({}) and lifeExpectancy ({})",
            request.plan.current_age, request.plan.life_expectancy
        )));
    }

    let ticket = begin_request(&state, &headers, "solve");
    let token = ticket.as_ref().map(|t| t.token().clone());
    let result: Option<SolveResult> = tokio::task::spawn_blocking(move || {
        if token.as_ref().is_some_and(CancelToken::is_cancelled) {
            return None;
        }
        Some(solve_request(&request))
    })
    .await?;

    let result = result.ok_or(ApiError::Superseded)?;
    deliver(ticket.as_ref(), result)
}

async fn scenarios_handler(body: Bytes) -> Result<Response, ApiError> {
    let payload: ScenariosPayload = serde_json::from_slice(&body)?;
    payload.plan.validate()?;
    for scenario in payload.scenarios.iter().filter(|s| !s.patch.is_empty()) {
        payload
            .plan
            .try_patched(&scenario.patch)
            .map_err(|e| ApiError::BadRequest(format!("scenario {:?}: {e}", scenario.label)))?;
    }

    let outcomes = tokio::task::spawn_blocking(move || {
        compare_scenarios(&payload.plan, &payload.scenarios)
    })
    .await?;
    Ok(json_response(StatusCode::OK, outcomes))
}

async fn load_plan_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let plan = load_current_plan(state.store.as_ref())?;
    Ok(json_response(StatusCode::OK, plan))
}

async fn save_plan_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let doc: Value = serde_json::from_slice(&body)?;
    save_current_plan(state.store.as_ref(), &doc)?;
    Ok(json_response(StatusCode::OK, json!({ "ok": true })))
}

fn begin_request(state: &AppState, headers: &HeaderMap, route: &str) -> Option<Ticket> {
    let client = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;
    Some(state.requests.begin(&format!("{client}:{route}")))
}

fn deliver<T: Serialize>(ticket: Option<&Ticket>, body: T) -> Result<Response, ApiError> {
    if ticket.is_some_and(Ticket::is_superseded) {
        return Err(ApiError::Superseded);
    }
    Ok(json_response(StatusCode::OK, body))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
