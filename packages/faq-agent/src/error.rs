use std::sync::Arc;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Knowledge base error: {0}")]
	Knowledge(#[from] faq_knowledge::Error),
	#[error("Chat model call failed: {0}")]
	Chat(#[from] faq_providers::Error),
	#[error("Memory store error: {0}")]
	Memory(#[from] faq_memory::Error),
	#[error("Agent stopped after {max_iterations} model calls without a final answer.")]
	IterationLimit { max_iterations: u32 },
	#[error("Invalid invocation payload: {0}")]
	Payload(#[from] serde_json::Error),
	#[error("Agent initialization failed: {0}")]
	Init(#[source] Arc<Error>),
}
