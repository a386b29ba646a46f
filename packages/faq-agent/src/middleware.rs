use std::sync::Arc;

use faq_domain::{Message, Role, SessionConfig};
use faq_memory::{MemoryItem, MemoryStore};

use crate::Result;

/// Reads and writes long-term memory around one agent turn.
#[derive(Clone)]
pub struct MemoryMiddleware {
	store: Arc<dyn MemoryStore>,
	preference_limit: usize,
}
impl MemoryMiddleware {
	pub fn new(store: Arc<dyn MemoryStore>, preference_limit: usize) -> Self {
		Self { store, preference_limit }
	}

	pub fn store(&self) -> &Arc<dyn MemoryStore> {
		&self.store
	}

	/// Persists the latest user message under `(actor, thread)`, then looks up the actor's
	/// preferences with it. A failed lookup is logged and yields no preferences.
	pub async fn before_model(
		&self,
		session: &SessionConfig,
		messages: &[Message],
	) -> Result<Vec<MemoryItem>> {
		let Some(user) = faq_domain::last_of_role(messages, Role::User) else {
			return Ok(Vec::new());
		};

		self.store.put(MemoryItem::new(session.history_namespace(), user.clone())).await?;

		let namespace = session.preferences_namespace();
		let preferences =
			match self.store.search(&namespace, &user.content, self.preference_limit).await {
				Ok(preferences) => preferences,
				Err(err) => {
					tracing::error!(
						actor_id = %session.actor_id,
						error = %err,
						"Memory retrieval failed."
					);

					return Ok(Vec::new());
				},
			};

		if !preferences.is_empty() {
			let memory_context = preferences
				.iter()
				.map(|item| format!("Memory: {}", item.message.content))
				.collect::<Vec<_>>()
				.join("\n");

			tracing::info!(
				actor_id = %session.actor_id,
				memories = %memory_context,
				"Retrieved memories."
			);
		}

		Ok(preferences)
	}

	/// Persists the latest assistant message under `(actor, thread)`, if any.
	pub async fn after_model(&self, session: &SessionConfig, messages: &[Message]) -> Result<()> {
		let Some(assistant) = faq_domain::last_of_role(messages, Role::Assistant) else {
			return Ok(());
		};

		self.store.put(MemoryItem::new(session.history_namespace(), assistant.clone())).await?;

		tracing::info!(actor_id = %session.actor_id, "Saved assistant response to memory.");

		Ok(())
	}
}
