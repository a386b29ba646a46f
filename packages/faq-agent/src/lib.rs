pub mod agent;
pub mod entrypoint;
pub mod middleware;
pub mod tools;

mod error;

pub use agent::{DEFAULT_SYSTEM_PROMPT, FaqAgent, NO_RESPONSE};
pub use entrypoint::{AgentCell, Invocation, InvocationResponse, NO_PROMPT};
pub use error::{Error, Result};
pub use middleware::MemoryMiddleware;
pub use tools::FaqTools;

use std::{future::Future, pin::Pin, sync::Arc};

use faq_config::Config;
use faq_knowledge::KnowledgeBase;
use faq_memory::{Checkpointer, InMemoryCheckpointer, MemoryStore};
use faq_providers::{ChatProvider, EmbeddingProvider, HttpProviders};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let http = Arc::new(HttpProviders::default());

		Self { embedding: http.clone(), chat: http }
	}
}

/// Builds the knowledge base and memory backend named by `cfg` and wires them into an agent.
pub async fn build_agent(cfg: &Config, providers: Providers) -> Result<FaqAgent> {
	let kb =
		KnowledgeBase::build(&cfg.knowledge, cfg.providers.embedding.clone(), providers.embedding)
			.await?;
	let store = faq_memory::open_store(&cfg.memory).await?;

	Ok(assemble(cfg, Arc::new(kb), store, providers.chat))
}

/// Wires prebuilt parts into an agent with a fresh in-memory checkpointer.
pub fn assemble(
	cfg: &Config,
	kb: Arc<KnowledgeBase>,
	store: Arc<dyn MemoryStore>,
	chat: Arc<dyn ChatProvider>,
) -> FaqAgent {
	let tools = FaqTools::new(kb, &cfg.knowledge);
	let middleware = MemoryMiddleware::new(store, cfg.memory.preference_limit as usize);
	let checkpointer: Arc<dyn Checkpointer> = Arc::new(InMemoryCheckpointer::default());

	FaqAgent::new(cfg, chat, tools, middleware, checkpointer)
}

impl AgentCell {
	/// A cell that runs [`build_agent`] on first use.
	pub fn from_config(cfg: Config, providers: Providers) -> Self {
		let cfg = Arc::new(cfg);

		Self::new(move || {
			let cfg = cfg.clone();
			let providers = providers.clone();

			async move { build_agent(&cfg, providers).await }
		})
	}
}
