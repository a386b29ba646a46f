use std::{
	collections::HashMap,
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use faq_domain::Namespace;

use crate::{BoxFuture, MemoryItem, MemoryStore, Result};

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
	items: RwLock<HashMap<Namespace, Vec<MemoryItem>>>,
}
impl InMemoryStore {
	pub(crate) fn insert(&self, item: MemoryItem) {
		self.write().entry(item.namespace.clone()).or_default().push(item);
	}

	pub(crate) fn search_now(
		&self,
		namespace: &Namespace,
		query: &str,
		limit: usize,
	) -> Vec<MemoryItem> {
		self.read()
			.get(namespace)
			.map(|items| crate::search::rank(items, query, limit))
			.unwrap_or_default()
	}

	pub(crate) fn list_now(&self, namespace: &Namespace) -> Vec<MemoryItem> {
		self.read().get(namespace).cloned().unwrap_or_default()
	}

	fn read(&self) -> RwLockReadGuard<'_, HashMap<Namespace, Vec<MemoryItem>>> {
		self.items.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, HashMap<Namespace, Vec<MemoryItem>>> {
		self.items.write().unwrap_or_else(|err| err.into_inner())
	}
}
impl MemoryStore for InMemoryStore {
	fn put<'a>(&'a self, item: MemoryItem) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.insert(item);

			Ok(())
		})
	}

	fn search<'a>(
		&'a self,
		namespace: &'a Namespace,
		query: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<MemoryItem>>> {
		Box::pin(async move { Ok(self.search_now(namespace, query, limit)) })
	}

	fn list<'a>(&'a self, namespace: &'a Namespace) -> BoxFuture<'a, Result<Vec<MemoryItem>>> {
		Box::pin(async move { Ok(self.list_now(namespace)) })
	}
}
