use std::path::{Path, PathBuf};

use tokio::{
	fs::{File, OpenOptions},
	io::AsyncWriteExt,
	sync::Mutex,
};

use faq_domain::Namespace;

use crate::{BoxFuture, Error, InMemoryStore, MemoryItem, MemoryStore, Result};

/// JSON Lines log at `<dir>/<memory_id>.jsonl`, replayed into memory on open.
#[derive(Debug)]
pub struct FileStore {
	path: PathBuf,
	items: InMemoryStore,
	file: Mutex<File>,
}
impl FileStore {
	pub async fn open(dir: &Path, memory_id: &str) -> Result<Self> {
		let path = dir.join(format!("{}.jsonl", file_stem(memory_id)));
		let io_err = |source| Error::Io { path: path.clone(), source };

		tokio::fs::create_dir_all(dir).await.map_err(io_err)?;

		let items = InMemoryStore::default();
		let mut replayed = 0_usize;

		if tokio::fs::try_exists(&path).await.map_err(io_err)? {
			let raw = tokio::fs::read_to_string(&path).await.map_err(io_err)?;

			for (line_idx, line) in raw.lines().enumerate() {
				if line.trim().is_empty() {
					continue;
				}

				let item: MemoryItem = serde_json::from_str(line).map_err(|source| {
					Error::Decode { path: path.clone(), line: line_idx + 1, source }
				})?;

				items.insert(item);

				replayed += 1;
			}
		}

		let file =
			OpenOptions::new().create(true).append(true).open(&path).await.map_err(io_err)?;

		tracing::info!(path = %path.display(), replayed, "Opened memory file.");

		Ok(Self { path, items, file: Mutex::new(file) })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl MemoryStore for FileStore {
	fn put<'a>(&'a self, item: MemoryItem) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut line = serde_json::to_vec(&item)?;

			line.push(b'\n');

			{
				let mut file = self.file.lock().await;
				let io_err = |source| Error::Io { path: self.path.clone(), source };

				file.write_all(&line).await.map_err(io_err)?;
				file.flush().await.map_err(io_err)?;
			}

			self.items.insert(item);

			Ok(())
		})
	}

	fn search<'a>(
		&'a self,
		namespace: &'a Namespace,
		query: &'a str,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<MemoryItem>>> {
		Box::pin(async move { Ok(self.items.search_now(namespace, query, limit)) })
	}

	fn list<'a>(&'a self, namespace: &'a Namespace) -> BoxFuture<'a, Result<Vec<MemoryItem>>> {
		Box::pin(async move { Ok(self.items.list_now(namespace)) })
	}
}

fn file_stem(memory_id: &str) -> String {
	memory_id
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
		.collect()
}
