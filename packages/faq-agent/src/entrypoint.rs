use std::{error::Error as StdError, future::Future, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use faq_domain::{DEFAULT_ACTOR_ID, DEFAULT_THREAD_ID, SessionConfig};

use crate::{BoxFuture, Error, FaqAgent, Result};

pub const NO_PROMPT: &str = "No prompt found in input";

type Builder = Box<dyn Fn() -> BoxFuture<'static, Result<FaqAgent>> + Send + Sync>;

/// Builds the agent on first use and shares it afterwards. A failed build is kept and returned to
/// every later caller; concurrent first callers wait on the same build.
pub struct AgentCell {
	cell: OnceCell<std::result::Result<Arc<FaqAgent>, Arc<Error>>>,
	builder: Builder,
}
impl AgentCell {
	pub fn new<F, Fut>(builder: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<FaqAgent>> + Send + 'static,
	{
		Self { cell: OnceCell::new(), builder: Box::new(move || Box::pin(builder())) }
	}

	pub async fn get(&self) -> Result<Arc<FaqAgent>> {
		let slot = self
			.cell
			.get_or_init(|| async {
				(self.builder)().await.map(Arc::new).map_err(|err| {
					tracing::error!(error = %err, "Agent initialization failed.");

					Arc::new(err)
				})
			})
			.await;

		match slot {
			Ok(agent) => Ok(agent.clone()),
			Err(err) => Err(Error::Init(err.clone())),
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.cell.initialized()
	}
}

/// Fields read from an invocation payload, defaults applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
	pub prompt: String,
	pub session: SessionConfig,
}
impl Invocation {
	/// Missing or non-string fields fall back: prompt to [`NO_PROMPT`], actor to the default
	/// user, thread to `session_id` and then the default session.
	pub fn from_payload(payload: &Value) -> Self {
		let field = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);
		let prompt = field("prompt").unwrap_or_else(|| NO_PROMPT.to_string());
		let actor_id = field("actor_id").unwrap_or_else(|| DEFAULT_ACTOR_ID.to_string());
		let thread_id = field("thread_id")
			.or_else(|| field("session_id"))
			.unwrap_or_else(|| DEFAULT_THREAD_ID.to_string());

		Self { prompt, session: SessionConfig::new(actor_id, thread_id) }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvocationResponse {
	Success { result: String, actor_id: String, thread_id: String },
	Failure { error: String, traceback: String },
}
impl InvocationResponse {
	pub fn failure(err: &Error) -> Self {
		Self::Failure { error: err.to_string(), traceback: traceback(err) }
	}
}

/// Decodes a raw request body and runs it. A body that is not JSON becomes a failure response.
pub async fn invoke_body(cell: &AgentCell, body: &[u8]) -> InvocationResponse {
	match serde_json::from_slice::<Value>(body) {
		Ok(payload) => invoke(cell, &payload).await,
		Err(err) => {
			let err = Error::Payload(err);

			tracing::warn!(error = %err, "Rejected invocation payload.");

			InvocationResponse::failure(&err)
		},
	}
}

/// Runs one invocation. Never fails: errors come back as [`InvocationResponse::Failure`].
pub async fn invoke(cell: &AgentCell, payload: &Value) -> InvocationResponse {
	let invocation = Invocation::from_payload(payload);
	let session = &invocation.session;

	tracing::info!(
		actor_id = %session.actor_id,
		thread_id = %session.thread_id,
		"Received invocation."
	);

	let outcome = match cell.get().await {
		Ok(agent) => agent.invoke(&invocation.prompt, session).await,
		Err(err) => Err(err),
	};

	match outcome {
		Ok(result) => {
			tracing::info!(actor_id = %session.actor_id, "Response generated.");

			InvocationResponse::Success {
				result,
				actor_id: session.actor_id.clone(),
				thread_id: session.thread_id.clone(),
			}
		},
		Err(err) => InvocationResponse::failure(&err),
	}
}

/// The error and its sources, one per line.
pub fn traceback(err: &(dyn StdError + 'static)) -> String {
	let mut lines = vec![format!("Error: {err}")];
	let mut source = err.source();

	while let Some(cause) = source {
		lines.push(format!("Caused by: {cause}"));

		source = cause.source();
	}

	lines.join("\n")
}
