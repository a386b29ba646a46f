pub mod chunking;
pub mod index;
pub mod loader;

mod error;

pub use chunking::{Chunk, ChunkingConfig};
pub use error::{Error, Result};
pub use index::{FlatIndex, ScoredChunk};
pub use loader::FaqRecord;

use std::sync::Arc;

use faq_config::{EmbeddingProviderConfig, Knowledge};
use faq_providers::EmbeddingProvider;

const EMBED_BATCH_SIZE: usize = 64;

/// The FAQ dataset chunked, embedded, and indexed once. Read-only after construction.
pub struct KnowledgeBase {
	index: FlatIndex,
	embedding: EmbeddingProviderConfig,
	provider: Arc<dyn EmbeddingProvider>,
}
impl KnowledgeBase {
	/// Loads (or downloads) the dataset named by `cfg` and indexes it.
	pub async fn build(
		cfg: &Knowledge,
		embedding: EmbeddingProviderConfig,
		provider: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let path = loader::ensure_dataset(cfg).await?;
		let records = loader::load_csv(&path)?;

		Self::from_records(&records, ChunkingConfig::from(cfg), embedding, provider).await
	}

	pub async fn from_records(
		records: &[FaqRecord],
		chunking: ChunkingConfig,
		embedding: EmbeddingProviderConfig,
		provider: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let chunks: Vec<Chunk> = records
			.iter()
			.enumerate()
			.flat_map(|(record_index, record)| {
				chunking::split_text(record_index, &record.text(), &chunking)
			})
			.collect();
		let mut index = FlatIndex::new(embedding.dimensions as usize);

		for batch in chunks.chunks(EMBED_BATCH_SIZE) {
			let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
			let vectors = provider.embed(&embedding, &texts).await?;

			if vectors.len() != batch.len() {
				return Err(Error::VectorCountMismatch {
					expected: batch.len(),
					actual: vectors.len(),
				});
			}

			for (chunk, vector) in batch.iter().cloned().zip(vectors) {
				index.insert(chunk, vector)?;
			}
		}

		tracing::info!(
			records = records.len(),
			chunks = index.len(),
			model = %embedding.model,
			"Knowledge base indexed."
		);

		Ok(Self { index, embedding, provider })
	}

	pub fn len(&self) -> usize {
		self.index.len()
	}

	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	pub fn chunks(&self) -> &[Chunk] {
		self.index.chunks()
	}

	/// Up to `k` chunks, most similar first. Fewer only when the index holds fewer chunks.
	pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
		if k == 0 || self.index.is_empty() {
			return Ok(Vec::new());
		}

		let texts = [query.to_string()];
		let mut vectors = self.provider.embed(&self.embedding, &texts).await?;
		let Some(vector) = vectors.pop() else {
			return Err(Error::VectorCountMismatch { expected: 1, actual: 0 });
		};
		let hits = self.index.search(&vector, k)?;

		tracing::debug!(k, hits = hits.len(), "Similarity search completed.");

		Ok(hits)
	}
}
