use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ACTOR_ID: &str = "default-user";
pub const DEFAULT_THREAD_ID: &str = "default-session";
pub const HISTORY_NAMESPACE: &str = "history";
pub const PREFERENCES_NAMESPACE: &str = "preferences";

/// Per-request scope. Every memory read and write of one turn derives its namespace from here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionConfig {
	pub actor_id: String,
	pub thread_id: String,
}
impl SessionConfig {
	pub fn new(actor_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
		Self { actor_id: actor_id.into(), thread_id: thread_id.into() }
	}

	/// `("history", actor, thread)`: turn history. The leading tag keeps it apart from preference
	/// namespaces whatever the ids contain.
	pub fn history_namespace(&self) -> Namespace {
		Namespace::new([HISTORY_NAMESPACE, self.actor_id.as_str(), self.thread_id.as_str()])
	}

	/// `("preferences", actor)`: cross-session preferences.
	pub fn preferences_namespace(&self) -> Namespace {
		Namespace::new([PREFERENCES_NAMESPACE, self.actor_id.as_str()])
	}
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self::new(DEFAULT_ACTOR_ID, DEFAULT_THREAD_ID)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Vec<String>);
impl Namespace {
	pub fn new<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(parts.into_iter().map(Into::into).collect())
	}

	pub fn parts(&self) -> &[String] {
		&self.0
	}
}
impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join("/"))
	}
}
