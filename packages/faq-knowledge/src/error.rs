use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read dataset at {path:?}.")]
	ReadDataset { path: PathBuf, source: csv::Error },
	#[error("Dataset at {path:?} is missing the {column} column.")]
	MissingColumn { path: PathBuf, column: &'static str },
	#[error("Failed to download dataset from {url}.")]
	Download { url: String, source: reqwest::Error },
	#[error("Failed to write dataset cache at {path:?}.")]
	WriteCache { path: PathBuf, source: std::io::Error },
	#[error("Embedding provider failed.")]
	Provider(#[from] faq_providers::Error),
	#[error("Embedding dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Embedding provider returned {actual} vectors for {expected} chunks.")]
	VectorCountMismatch { expected: usize, actual: usize },
}
