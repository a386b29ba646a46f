use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	routing::{get, post},
};
use serde::Serialize;

use faq_agent::InvocationResponse;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct PingResponse {
	status: &'static str,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/invocations", post(invocations))
		.route("/ping", get(ping))
		.with_state(state)
}

async fn ping() -> Json<PingResponse> {
	Json(PingResponse { status: "Healthy" })
}

// Always 200. Failures, undecodable bodies included, are reported in the body.
async fn invocations(State(state): State<AppState>, body: Bytes) -> Json<InvocationResponse> {
	Json(faq_agent::entrypoint::invoke_body(&state.agent, &body).await)
}
