use crate::{Error, Result, chunking::Chunk};

/// A chunk paired with its squared L2 distance to the query. Lower is closer.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
	pub chunk: Chunk,
	pub distance: f32,
}

/// Exact nearest-neighbor index over fixed-dimension vectors.
#[derive(Debug, Default)]
pub struct FlatIndex {
	dimensions: usize,
	chunks: Vec<Chunk>,
	vectors: Vec<Vec<f32>>,
}
impl FlatIndex {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions, chunks: Vec::new(), vectors: Vec::new() }
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
		check_dimensions(self.dimensions, &vector)?;

		self.chunks.push(chunk);
		self.vectors.push(vector);

		Ok(())
	}

	/// Up to `k` chunks ordered by ascending distance. Equal distances keep insertion order.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
		check_dimensions(self.dimensions, query)?;

		let mut scored: Vec<(usize, f32)> = self
			.vectors
			.iter()
			.enumerate()
			.map(|(pos, vector)| (pos, squared_l2(query, vector)))
			.collect();

		scored.sort_by(|(lhs_pos, lhs), (rhs_pos, rhs)| {
			lhs.total_cmp(rhs).then_with(|| lhs_pos.cmp(rhs_pos))
		});
		scored.truncate(k);

		Ok(scored
			.into_iter()
			.map(|(pos, distance)| ScoredChunk { chunk: self.chunks[pos].clone(), distance })
			.collect())
	}
}

fn check_dimensions(expected: usize, vector: &[f32]) -> Result<()> {
	if vector.len() != expected {
		return Err(Error::DimensionMismatch { expected, actual: vector.len() });
	}

	Ok(())
}

fn squared_l2(lhs: &[f32], rhs: &[f32]) -> f32 {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| (l - r) * (l - r)).sum()
}
