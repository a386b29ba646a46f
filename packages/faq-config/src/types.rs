use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub knowledge: Knowledge,
	pub providers: Providers,
	#[serde(default)]
	pub agent: Agent,
	pub memory: Memory,
	#[serde(default)]
	pub secrets: Secrets,
	#[serde(default)]
	pub runtime: Runtime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub runtime_bind: String,
	pub web_bind: String,
	pub log_level: String,
	/// Optional. When set, logs are also appended to `<log_dir>/app.log`.
	#[serde(default)]
	pub log_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Knowledge {
	/// Local CSV path. Doubles as the download cache when `object_store` is set.
	pub data_path: PathBuf,
	#[serde(default = "default_chunk_size")]
	pub chunk_size: u32,
	#[serde(default)]
	pub chunk_overlap: u32,
	#[serde(default = "default_search_k")]
	pub search_k: u32,
	#[serde(default = "default_detailed_k")]
	pub detailed_k: u32,
	#[serde(default)]
	pub object_store: Option<ObjectStore>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ObjectStore {
	pub endpoint: String,
	pub bucket: String,
	pub key: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub chat: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Agent {
	/// Upper bound on model calls within one turn.
	pub max_iterations: u32,
	pub system_prompt: Option<String>,
	/// Build the agent while the runtime starts instead of on the first invocation.
	pub eager_init: bool,
}
impl Default for Agent {
	fn default() -> Self {
		Self { max_iterations: 8, system_prompt: None, eager_init: false }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Memory {
	pub memory_id: String,
	#[serde(default = "default_memory_backend")]
	pub backend: String,
	#[serde(default)]
	pub dir: Option<PathBuf>,
	#[serde(default = "default_preference_limit")]
	pub preference_limit: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Secrets {
	pub name: Option<String>,
	pub dir: PathBuf,
}
impl Default for Secrets {
	fn default() -> Self {
		Self { name: None, dir: PathBuf::from("/run/secrets") }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Runtime {
	pub region: String,
	pub agent_runtime_arn: String,
	pub agent_runtime_url: String,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
}
impl Default for Runtime {
	fn default() -> Self {
		Self {
			region: "us-east-1".to_string(),
			agent_runtime_arn: String::new(),
			agent_runtime_url: String::new(),
			api_key: None,
			timeout_ms: 120_000,
		}
	}
}

/// Body of the secret file referenced by `secrets.name`.
#[derive(Clone, Debug, Deserialize)]
pub struct SecretBundle {
	#[serde(rename = "GROQ_API_KEY", default)]
	pub api_key: Option<String>,
	#[serde(rename = "MEMORY_ID", default)]
	pub memory_id: Option<String>,
}

fn default_chunk_size() -> u32 {
	500
}

fn default_search_k() -> u32 {
	3
}

fn default_detailed_k() -> u32 {
	5
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_memory_backend() -> String {
	"in_memory".to_string()
}

fn default_preference_limit() -> u32 {
	5
}
