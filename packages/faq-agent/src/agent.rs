use std::sync::Arc;

use faq_config::{Config, LlmProviderConfig};
use faq_domain::{Message, SessionConfig};
use faq_memory::Checkpointer;
use faq_providers::{ChatProvider, ToolSpec};

use crate::{Error, FaqTools, MemoryMiddleware, Result};

pub const NO_RESPONSE: &str = "No response generated";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful FAQ assistant. You can search a knowledge base of frequently asked questions and \
you remember what each user told you in earlier conversations.

Answer accurately and briefly, using the tools:
- Start with search_faq to find entries relevant to the question.
- For a question with several parts, use reformulate_query to search each aspect separately.
- Use search_detailed_faq when the first search does not return enough.
- Tailor the answer to the user's known preferences where they matter.
- Base the answer on what the tools return. If nothing relevant is found, say so plainly.";

/// Tool-calling chat loop with memory hooks and per-session checkpoints.
pub struct FaqAgent {
	chat_cfg: LlmProviderConfig,
	chat: Arc<dyn ChatProvider>,
	tools: FaqTools,
	tool_specs: Vec<ToolSpec>,
	middleware: MemoryMiddleware,
	checkpointer: Arc<dyn Checkpointer>,
	system_prompt: String,
	max_iterations: u32,
}
impl FaqAgent {
	pub fn new(
		cfg: &Config,
		chat: Arc<dyn ChatProvider>,
		tools: FaqTools,
		middleware: MemoryMiddleware,
		checkpointer: Arc<dyn Checkpointer>,
	) -> Self {
		let tool_specs = tools.specs();
		let system_prompt =
			cfg.agent.system_prompt.clone().unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

		tracing::info!(
			model = %cfg.providers.chat.model,
			provider_id = %cfg.providers.chat.provider_id,
			tools = tool_specs.len(),
			"FAQ agent built."
		);

		Self {
			chat_cfg: cfg.providers.chat.clone(),
			chat,
			tools,
			tool_specs,
			middleware,
			checkpointer,
			system_prompt,
			max_iterations: cfg.agent.max_iterations,
		}
	}

	pub fn middleware(&self) -> &MemoryMiddleware {
		&self.middleware
	}

	/// Runs one turn and returns the final answer text.
	pub async fn invoke(&self, query: &str, session: &SessionConfig) -> Result<String> {
		match self.run_turn(query, session).await {
			Ok(answer) => Ok(answer),
			Err(err) => {
				tracing::error!(
					actor_id = %session.actor_id,
					thread_id = %session.thread_id,
					error = %err,
					"Agent invocation failed."
				);

				Err(err)
			},
		}
	}

	async fn run_turn(&self, query: &str, session: &SessionConfig) -> Result<String> {
		let mut messages = self.checkpointer.load(session).await?;

		messages.push(Message::user(query));

		self.middleware.before_model(session, &messages).await?;
		self.run_loop(&mut messages).await?;
		self.middleware.after_model(session, &messages).await?;
		self.checkpointer.save(session, messages.clone()).await?;

		Ok(messages
			.last()
			.map(|message| message.content.clone())
			.unwrap_or_else(|| NO_RESPONSE.to_string()))
	}

	async fn run_loop(&self, messages: &mut Vec<Message>) -> Result<()> {
		for iteration in 0..self.max_iterations {
			let mut request = Vec::with_capacity(messages.len() + 1);

			request.push(Message::system(self.system_prompt.as_str()));
			request.extend(messages.iter().cloned());

			let reply = self.chat.complete(&self.chat_cfg, &request, &self.tool_specs).await?;
			let calls = reply.tool_calls.clone();

			messages.push(reply);

			if calls.is_empty() {
				tracing::debug!(iterations = iteration + 1, "Agent produced a final answer.");

				return Ok(());
			}

			for call in &calls {
				let output = self.tools.call(call).await?;

				messages.push(Message::tool(call.id.as_str(), output));
			}
		}

		Err(Error::IterationLimit { max_iterations: self.max_iterations })
	}
}
