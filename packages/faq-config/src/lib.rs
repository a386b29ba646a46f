mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agent, Config, EmbeddingProviderConfig, Knowledge, LlmProviderConfig, Memory, ObjectStore,
	Providers, Runtime, SecretBundle, Secrets, Service,
};

use std::{
	env, fs,
	net::SocketAddr,
	path::{Path, PathBuf},
};

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_AGENT_RUNTIME_ARN: &str = "AGENT_RUNTIME_ARN";
pub const ENV_AGENT_RUNTIME_URL: &str = "AGENT_RUNTIME_URL";
pub const ENV_MEMORY_ID: &str = "MEMORY_ID";
pub const ENV_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_SECRET_NAME: &str = "SECRET_NAME";

pub const MEMORY_BACKENDS: [&str; 2] = ["in_memory", "file"];

/// Which binary is loading the file. The web proxy never touches the model, the knowledge base,
/// or memory, so it skips their credentials and checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
	Runtime,
	Web,
}

pub fn load(path: &Path, profile: Profile) -> Result<Config> {
	load_with_env(path, profile, |key| env::var(key).ok())
}

/// Same as [`load`], with environment lookups routed through `lookup`.
pub fn load_with_env<F>(path: &Path, profile: Profile, lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	apply_env_overrides(&mut cfg, lookup);

	if profile == Profile::Runtime
		&& let Some(bundle) = read_secret(&cfg.secrets)?
	{
		apply_secret(&mut cfg, bundle);
	}

	validate(&cfg, profile)?;

	Ok(cfg)
}

pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

	if let Some(region) = present(ENV_REGION) {
		cfg.runtime.region = region;
	}
	if let Some(arn) = present(ENV_AGENT_RUNTIME_ARN) {
		cfg.runtime.agent_runtime_arn = arn;
	}
	if let Some(url) = present(ENV_AGENT_RUNTIME_URL) {
		cfg.runtime.agent_runtime_url = url;
	}
	if let Some(memory_id) = present(ENV_MEMORY_ID) {
		cfg.memory.memory_id = memory_id;
	}
	if let Some(api_key) = present(ENV_API_KEY) {
		cfg.providers.chat.api_key = api_key;
	}
	if let Some(name) = present(ENV_SECRET_NAME) {
		cfg.secrets.name = Some(name);
	}
}

pub fn secret_path(secrets: &Secrets, name: &str) -> PathBuf {
	secrets.dir.join(format!("{name}.json"))
}

/// Reads the secret bundle named by `secrets.name`; `None` when no secret is configured.
pub fn read_secret(secrets: &Secrets) -> Result<Option<SecretBundle>> {
	let Some(name) = secrets.name.as_deref() else { return Ok(None) };
	let path = secret_path(secrets, name);
	let raw = fs::read_to_string(&path).map_err(|err| Error::ReadSecret {
		name: name.to_string(),
		path: path.clone(),
		source: err,
	})?;
	let bundle = serde_json::from_str(&raw)
		.map_err(|err| Error::ParseSecret { name: name.to_string(), source: err })?;

	Ok(Some(bundle))
}

/// Fills blank credentials from the secret bundle. Values already present win.
pub fn apply_secret(cfg: &mut Config, bundle: SecretBundle) {
	if cfg.providers.chat.api_key.trim().is_empty()
		&& let Some(api_key) = bundle.api_key
	{
		cfg.providers.chat.api_key = api_key;
	}
	if cfg.memory.memory_id.trim().is_empty()
		&& let Some(memory_id) = bundle.memory_id
	{
		cfg.memory.memory_id = memory_id;
	}
}

pub fn validate(cfg: &Config, profile: Profile) -> Result<()> {
	for (label, bind) in [
		("service.runtime_bind", &cfg.service.runtime_bind),
		("service.web_bind", &cfg.service.web_bind),
	] {
		if bind.parse::<SocketAddr>().is_err() {
			return Err(Error::Validation {
				message: format!("{label} must be a valid socket address."),
			});
		}
	}

	if cfg.runtime.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "runtime.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if profile == Profile::Web {
		return Ok(());
	}

	if cfg.knowledge.chunk_size == 0 {
		return Err(Error::Validation {
			message: "knowledge.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.knowledge.chunk_overlap >= cfg.knowledge.chunk_size {
		return Err(Error::Validation {
			message: "knowledge.chunk_overlap must be less than knowledge.chunk_size.".to_string(),
		});
	}
	if cfg.knowledge.search_k == 0 || cfg.knowledge.detailed_k == 0 {
		return Err(Error::Validation {
			message: "knowledge.search_k and knowledge.detailed_k must be greater than zero."
				.to_string(),
		});
	}

	if let Some(object_store) = cfg.knowledge.object_store.as_ref() {
		for (label, value) in [
			("knowledge.object_store.endpoint", &object_store.endpoint),
			("knowledge.object_store.bucket", &object_store.bucket),
			("knowledge.object_store.key", &object_store.key),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.chat.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: format!(
				"providers.chat.api_key must be non-empty. Set it in the config, {ENV_API_KEY}, or the configured secret."
			),
		});
	}
	if !cfg.providers.chat.temperature.is_finite()
		|| !(0.0..=2.0).contains(&cfg.providers.chat.temperature)
	{
		return Err(Error::Validation {
			message: "providers.chat.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.agent.max_iterations == 0 {
		return Err(Error::Validation {
			message: "agent.max_iterations must be greater than zero.".to_string(),
		});
	}
	if cfg.memory.memory_id.trim().is_empty() {
		return Err(Error::Validation {
			message: format!(
				"memory.memory_id must be non-empty. Set it in the config, {ENV_MEMORY_ID}, or the configured secret."
			),
		});
	}
	if !MEMORY_BACKENDS.contains(&cfg.memory.backend.as_str()) {
		return Err(Error::Validation {
			message: "memory.backend must be one of in_memory or file.".to_string(),
		});
	}
	if cfg.memory.backend == "file" && cfg.memory.dir.is_none() {
		return Err(Error::Validation {
			message: "memory.dir is required when memory.backend is file.".to_string(),
		});
	}
	if cfg.memory.preference_limit == 0 {
		return Err(Error::Validation {
			message: "memory.preference_limit must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.agent.system_prompt.as_deref().map(|prompt| prompt.trim().is_empty()).unwrap_or(false) {
		cfg.agent.system_prompt = None;
	}
	if cfg.runtime.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.runtime.api_key = None;
	}
	if cfg.secrets.name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
		cfg.secrets.name = None;
	}

	cfg.memory.backend = cfg.memory.backend.trim().to_ascii_lowercase();
}
