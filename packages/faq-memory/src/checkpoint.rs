use std::{collections::HashMap, sync::RwLock};

use faq_domain::{Message, SessionConfig};

use crate::{BoxFuture, Result};

/// Full conversation state per `(actor, thread)`, restored at the start of each turn.
pub trait Checkpointer
where
	Self: Send + Sync,
{
	fn load<'a>(&'a self, session: &'a SessionConfig) -> BoxFuture<'a, Result<Vec<Message>>>;

	fn save<'a>(
		&'a self,
		session: &'a SessionConfig,
		messages: Vec<Message>,
	) -> BoxFuture<'a, Result<()>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
	sessions: RwLock<HashMap<SessionConfig, Vec<Message>>>,
}
impl Checkpointer for InMemoryCheckpointer {
	fn load<'a>(&'a self, session: &'a SessionConfig) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			let sessions = self.sessions.read().unwrap_or_else(|err| err.into_inner());

			Ok(sessions.get(session).cloned().unwrap_or_default())
		})
	}

	fn save<'a>(
		&'a self,
		session: &'a SessionConfig,
		messages: Vec<Message>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut sessions = self.sessions.write().unwrap_or_else(|err| err.into_inner());

			sessions.insert(session.clone(), messages);

			Ok(())
		})
	}
}
