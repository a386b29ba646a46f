use unicode_segmentation::UnicodeSegmentation;

/// Chunk bounds measured in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingConfig {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
}
impl From<&faq_config::Knowledge> for ChunkingConfig {
	fn from(cfg: &faq_config::Knowledge) -> Self {
		Self { chunk_size: cfg.chunk_size as usize, chunk_overlap: cfg.chunk_overlap as usize }
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub record_index: usize,
	pub chunk_index: usize,
	/// Byte offsets into the record text.
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// Splits `text` into whitespace-trimmed chunks of at most `chunk_size` characters. Sentences are
/// kept whole when they fit, then words, then grapheme clusters. Consecutive chunks share up to
/// `chunk_overlap` characters of trailing units.
pub fn split_text(record_index: usize, text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	let max = cfg.chunk_size.max(1);
	let units = units(text, max);
	let mut chunks = Vec::new();
	let mut window: Vec<(usize, &str)> = Vec::new();
	let mut window_chars = 0_usize;

	for (idx, unit) in units {
		let unit_chars = unit.chars().count();

		if window_chars + unit_chars > max && !window.is_empty() {
			push_chunk(&mut chunks, record_index, text, &window);

			let keep = overlap_start(&window, cfg.chunk_overlap, max.saturating_sub(unit_chars));

			window.drain(..keep);

			window_chars = window.iter().map(|(_, unit)| unit.chars().count()).sum();
		}

		window.push((idx, unit));

		window_chars += unit_chars;
	}

	if !window.is_empty() {
		push_chunk(&mut chunks, record_index, text, &window);
	}

	chunks
}

fn units(text: &str, max: usize) -> Vec<(usize, &str)> {
	let mut out = Vec::new();

	for (idx, sentence) in text.split_sentence_bound_indices() {
		if sentence.chars().count() <= max {
			out.push((idx, sentence));

			continue;
		}

		for (word_idx, word) in sentence.split_word_bound_indices() {
			if word.chars().count() <= max {
				out.push((idx + word_idx, word));

				continue;
			}

			for (grapheme_idx, grapheme) in word.grapheme_indices(true) {
				out.push((idx + word_idx + grapheme_idx, grapheme));
			}
		}
	}

	out
}

// Index of the first window unit carried into the next chunk. The carried tail stays within the
// overlap budget and leaves room for the incoming unit.
fn overlap_start(window: &[(usize, &str)], overlap: usize, room: usize) -> usize {
	let budget = overlap.min(room);
	let mut carried = 0_usize;
	let mut start = window.len();

	for (pos, (_, unit)) in window.iter().enumerate().rev() {
		let unit_chars = unit.chars().count();

		if carried + unit_chars > budget {
			break;
		}

		carried += unit_chars;
		start = pos;
	}

	start
}

fn push_chunk(chunks: &mut Vec<Chunk>, record_index: usize, text: &str, window: &[(usize, &str)]) {
	let (Some((first, _)), Some((last, last_unit))) = (window.first(), window.last()) else {
		return;
	};
	let raw = &text[*first..*last + last_unit.len()];
	let leading = raw.len() - raw.trim_start().len();
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return;
	}

	let start_offset = first + leading;

	chunks.push(Chunk {
		record_index,
		chunk_index: chunks.iter().filter(|chunk| chunk.record_index == record_index).count(),
		start_offset,
		end_offset: start_offset + trimmed.len(),
		text: trimmed.to_string(),
	});
}
