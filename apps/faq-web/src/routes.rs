use std::{path::Path, time::Duration};

use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub const HEADER_RUNTIME_ARN: &str = "X-Agent-Runtime-Arn";
pub const HEADER_SESSION_ID: &str = "X-Agent-Session-Id";

const DEFAULT_ACTOR_ID: &str = "web-user";
const DEFAULT_THREAD_ID: &str = "web-session-1";

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatRequest {
	pub prompt: String,
	#[serde(default = "default_actor_id")]
	pub actor_id: String,
	#[serde(default = "default_thread_id")]
	pub thread_id: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
	status: &'static str,
	agent_runtime_arn: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

/// API routes first, static files for everything else.
pub fn router(state: AppState, static_dir: &Path) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/chat", post(chat))
		.with_state(state)
		.fallback_service(ServeDir::new(static_dir))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	let arn = state.runtime.agent_runtime_arn.as_str();

	Json(HealthResponse {
		status: "ok",
		agent_runtime_arn: if arn.is_empty() { "not-set".to_string() } else { arn.to_string() },
	})
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
	let runtime = state.runtime.as_ref();

	if runtime.agent_runtime_arn.is_empty() || runtime.agent_runtime_url.is_empty() {
		return Err(ApiError::new(
			StatusCode::SERVICE_UNAVAILABLE,
			"runtime_not_configured",
			"AGENT_RUNTIME_ARN environment variable is not set.",
		));
	}

	let url = format!("{}/invocations", runtime.agent_runtime_url.trim_end_matches('/'));
	let mut request = state
		.client
		.post(url)
		.timeout(Duration::from_millis(runtime.timeout_ms))
		.header(HEADER_RUNTIME_ARN, runtime.agent_runtime_arn.as_str())
		.header(HEADER_SESSION_ID, payload.thread_id.as_str())
		.json(&payload);

	if let Some(api_key) = runtime.api_key.as_deref() {
		request = request.bearer_auth(api_key);
	}

	let response = request.send().await.map_err(|err| {
		tracing::error!(error = %err, "Agent runtime request failed.");

		internal_error(err.to_string())
	})?;
	let status = response.status();

	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		let message = upstream_message(&body);

		tracing::warn!(status = status.as_u16(), %message, "Agent runtime returned an error.");

		return Err(ApiError::new(
			StatusCode::BAD_GATEWAY,
			"upstream_error",
			format!("Agent runtime error [{}]: {message}", status.as_u16()),
		));
	}

	let json = response.json::<Value>().await.map_err(|err| {
		tracing::error!(error = %err, "Agent runtime returned a non-JSON body.");

		internal_error(err.to_string())
	})?;

	tracing::info!(actor_id = %payload.actor_id, thread_id = %payload.thread_id, "Chat forwarded.");

	Ok(Json(json))
}

fn internal_error(message: String) -> ApiError {
	ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

// Prefer a `message` or `error` field from a JSON error body, else the raw text.
fn upstream_message(body: &str) -> String {
	let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
		["message", "error"]
			.iter()
			.find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
	});

	from_json.unwrap_or_else(|| body.trim().to_string())
}

fn default_actor_id() -> String {
	DEFAULT_ACTOR_ID.to_string()
}

fn default_thread_id() -> String {
	DEFAULT_THREAD_ID.to_string()
}
