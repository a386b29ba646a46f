pub mod message;
pub mod session;

pub use message::{Message, Role, ToolCall, last_of_role};
pub use session::{
	DEFAULT_ACTOR_ID, DEFAULT_THREAD_ID, HISTORY_NAMESPACE, Namespace, PREFERENCES_NAMESPACE,
	SessionConfig,
};
