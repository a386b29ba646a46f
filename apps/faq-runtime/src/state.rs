use std::sync::Arc;

use faq_agent::{AgentCell, Providers};

#[derive(Clone)]
pub struct AppState {
	pub agent: Arc<AgentCell>,
}
impl AppState {
	/// The agent is built on the first invocation with the HTTP providers.
	pub fn new(config: faq_config::Config) -> Self {
		Self::with_cell(AgentCell::from_config(config, Providers::default()))
	}

	pub fn with_cell(cell: AgentCell) -> Self {
		Self { agent: Arc::new(cell) }
	}
}
