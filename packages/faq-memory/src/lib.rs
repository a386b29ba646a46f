pub mod checkpoint;
pub mod file;
pub mod in_memory;

mod error;
mod search;

pub use checkpoint::{Checkpointer, InMemoryCheckpointer};
pub use error::{Error, Result};
pub use file::FileStore;
pub use in_memory::InMemoryStore;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use faq_domain::{Message, Namespace};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stored message. Keys are random and never reused.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
	pub namespace: Namespace,
	pub key: String,
	pub message: Message,
}
impl MemoryItem {
	pub fn new(namespace: Namespace, message: Message) -> Self {
		Self { namespace, key: Uuid::new_v4().to_string(), message }
	}
}

/// Append-only, namespaced long-term memory. Reads never cross namespaces.
pub trait MemoryStore
where
	Self: Send + Sync,
{
	fn put<'a>(&'a self, item: MemoryItem) -> BoxFuture<'a, Result<()>>;

	/// Items in `namespace` ranked against `query`. An empty query yields the most recent items.
	fn search<'a>(
		&'a self,
		namespace: &'a Namespace,
		query: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<MemoryItem>>>;

	/// Every item in `namespace`, oldest first.
	fn list<'a>(&'a self, namespace: &'a Namespace) -> BoxFuture<'a, Result<Vec<MemoryItem>>>;
}

/// Builds the store selected by `memory.backend`.
pub async fn open_store(cfg: &faq_config::Memory) -> Result<Arc<dyn MemoryStore>> {
	match cfg.backend.as_str() {
		"in_memory" => Ok(Arc::new(InMemoryStore::default())),
		"file" => {
			let Some(dir) = cfg.dir.as_deref() else {
				return Err(Error::Backend {
					message: "memory.dir is required for the file backend.".to_string(),
				});
			};

			Ok(Arc::new(FileStore::open(dir, &cfg.memory_id).await?))
		},
		other => Err(Error::UnknownBackend { backend: other.to_string() }),
	}
}
