use std::collections::HashSet;

use crate::MemoryItem;

/// Ranks `items` (oldest first) by distinct query-token overlap, newest first among equals.
/// Items sharing no token with a non-empty query are dropped.
pub(crate) fn rank(items: &[MemoryItem], query: &str, limit: usize) -> Vec<MemoryItem> {
	let query_tokens = tokens(query);
	let mut scored: Vec<(usize, usize)> = items
		.iter()
		.enumerate()
		.filter_map(|(pos, item)| {
			if query_tokens.is_empty() {
				return Some((pos, 0));
			}

			let item_tokens = tokens(&item.message.content);
			let overlap = query_tokens.intersection(&item_tokens).count();

			(overlap > 0).then_some((pos, overlap))
		})
		.collect();

	scored.sort_by(|(lhs_pos, lhs), (rhs_pos, rhs)| rhs.cmp(lhs).then(rhs_pos.cmp(lhs_pos)));

	scored.into_iter().take(limit).map(|(pos, _)| items[pos].clone()).collect()
}

fn tokens(text: &str) -> HashSet<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
		.collect()
}
