use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to access memory file at {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Memory file {path:?} has a malformed entry on line {line}.")]
	Decode { path: PathBuf, line: usize, source: serde_json::Error },
	#[error(transparent)]
	Encode(#[from] serde_json::Error),
	#[error("Unknown memory backend {backend:?}.")]
	UnknownBackend { backend: String },
	#[error("Memory backend failed: {message}")]
	Backend { message: String },
}
