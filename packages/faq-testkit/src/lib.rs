mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	env,
	path::{Path, PathBuf},
	sync::{
		Mutex,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
	time::{SystemTime, UNIX_EPOCH},
};

use serde_json::Map;

use faq_config::{
	Agent, Config, EmbeddingProviderConfig, Knowledge, LlmProviderConfig, Memory, Providers,
	Runtime, Secrets, Service,
};
use faq_domain::{Message, Namespace};
use faq_memory::{BoxFuture, InMemoryStore, MemoryItem, MemoryStore};
use faq_providers::{ChatProvider, EmbeddingProvider, ToolSpec};

/// Deterministic bag-of-words embedding: each lowercased token bumps one FNV-hashed bucket and
/// the result is L2-normalized. Texts sharing words land close together.
#[derive(Debug, Default)]
pub struct HashEmbedding {
	calls: AtomicUsize,
}
impl HashEmbedding {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn vector(text: &str, dimensions: usize) -> Vec<f32> {
		let mut vec = vec![0.0_f32; dimensions.max(1)];

		for token in text.split(|c: char| !c.is_alphanumeric()).filter(|token| !token.is_empty()) {
			let bucket = fnv1a(&token.to_lowercase()) as usize % vec.len();

			vec[bucket] += 1.0;
		}

		let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

		if norm > 0.0 {
			vec.iter_mut().for_each(|v| *v /= norm);
		}

		vec
	}
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> faq_providers::BoxFuture<'a, faq_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors =
			texts.iter().map(|text| Self::vector(text, cfg.dimensions as usize)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Chat model that replays queued replies and records every request it receives. Running out of
/// replies is an error.
#[derive(Debug, Default)]
pub struct ScriptedChat {
	replies: Mutex<VecDeque<std::result::Result<Message, String>>>,
	requests: Mutex<Vec<Vec<Message>>>,
}
impl ScriptedChat {
	pub fn new<I>(replies: I) -> Self
	where
		I: IntoIterator<Item = Message>,
	{
		let chat = Self::default();

		for reply in replies {
			chat.push_reply(reply);
		}

		chat
	}

	pub fn push_reply(&self, reply: Message) {
		self.replies.lock().unwrap_or_else(|err| err.into_inner()).push_back(Ok(reply));
	}

	/// Queues a failure surfaced as an upstream 500.
	pub fn push_error(&self, body: impl Into<String>) {
		self.replies.lock().unwrap_or_else(|err| err.into_inner()).push_back(Err(body.into()));
	}

	pub fn requests(&self) -> Vec<Vec<Message>> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl ChatProvider for ScriptedChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Message],
		_tools: &'a [ToolSpec],
	) -> faq_providers::BoxFuture<'a, faq_providers::Result<Message>> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(messages.to_vec());

		let next = self.replies.lock().unwrap_or_else(|err| err.into_inner()).pop_front();
		let result = match next {
			Some(Ok(message)) => Ok(message),
			Some(Err(body)) => Err(faq_providers::Error::Status { status: 500, body }),
			None => Err(faq_providers::Error::InvalidResponse {
				message: "No scripted reply left.".to_string(),
			}),
		};

		Box::pin(async move { result })
	}
}

/// Memory store whose writes and/or searches fail on demand. Successful calls go to an inner
/// in-memory store.
#[derive(Debug, Default)]
pub struct FailingStore {
	fail_put: bool,
	fail_search: bool,
	inner: InMemoryStore,
}
impl FailingStore {
	pub fn failing_search() -> Self {
		Self { fail_put: false, fail_search: true, inner: InMemoryStore::default() }
	}

	pub fn failing_put() -> Self {
		Self { fail_put: true, fail_search: false, inner: InMemoryStore::default() }
	}
}
impl MemoryStore for FailingStore {
	fn put<'a>(&'a self, item: MemoryItem) -> BoxFuture<'a, faq_memory::Result<()>> {
		if self.fail_put {
			return Box::pin(async { Err(backend_down()) });
		}

		self.inner.put(item)
	}

	fn search<'a>(
		&'a self,
		namespace: &'a Namespace,
		query: &'a str,
		limit: usize,
	) -> BoxFuture<'a, faq_memory::Result<Vec<MemoryItem>>> {
		if self.fail_search {
			return Box::pin(async { Err(backend_down()) });
		}

		self.inner.search(namespace, query, limit)
	}

	fn list<'a>(
		&'a self,
		namespace: &'a Namespace,
	) -> BoxFuture<'a, faq_memory::Result<Vec<MemoryItem>>> {
		self.inner.list(namespace)
	}
}

pub fn unique_path(prefix: &str, extension: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let mut path = env::temp_dir();

	path.push(format!("{prefix}_{nanos}_{}_{ordinal}.{extension}", std::process::id()));

	path
}

/// Writes a `question,answer` CSV to a fresh temp file.
pub fn write_dataset(rows: &[(&str, &str)]) -> Result<PathBuf> {
	let path = unique_path("faq_dataset", "csv");
	let mut writer = csv::Writer::from_path(&path)?;

	writer.write_record(["question", "answer"])?;

	for (question, answer) in rows {
		writer.write_record([*question, *answer])?;
	}

	writer.flush()?;

	Ok(path)
}

/// A valid runtime config pointing at `data_path`, with 8-dimension embeddings and an in-memory
/// store. Provider endpoints are unroutable; pair it with the stubs above.
pub fn sample_config(data_path: &Path) -> Config {
	Config {
		service: Service {
			runtime_bind: "127.0.0.1:0".to_string(),
			web_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			log_dir: None,
		},
		knowledge: Knowledge {
			data_path: data_path.to_path_buf(),
			chunk_size: 500,
			chunk_overlap: 0,
			search_k: 3,
			detailed_k: 5,
			object_store: None,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: String::new(),
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			chat: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test-chat".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		agent: Agent::default(),
		memory: Memory {
			memory_id: "memory-test".to_string(),
			backend: "in_memory".to_string(),
			dir: None,
			preference_limit: 5,
		},
		secrets: Secrets::default(),
		runtime: Runtime::default(),
	}
}

fn backend_down() -> faq_memory::Error {
	faq_memory::Error::Backend { message: "Memory backend is unavailable.".to_string() }
}

fn fnv1a(text: &str) -> u64 {
	text.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
		(hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
	})
}
