use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use faq_domain::ToolCall;
use faq_knowledge::{KnowledgeBase, ScoredChunk};
use faq_providers::ToolSpec;

use crate::Result;

pub const SEARCH_FAQ: &str = "search_faq";
pub const SEARCH_DETAILED_FAQ: &str = "search_detailed_faq";
pub const REFORMULATE_QUERY: &str = "reformulate_query";

const NO_FAQ_ENTRIES: &str = "No relevant FAQ entries found.";
const REFORMULATE_K: usize = 3;
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Deserialize)]
struct SearchFaqArgs {
	query: String,
}

#[derive(Debug, Deserialize)]
struct SearchDetailedFaqArgs {
	query: String,
	#[serde(default)]
	num_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReformulateQueryArgs {
	original_query: String,
	focus_aspect: String,
}

/// Read-only search tools over the knowledge base.
#[derive(Clone)]
pub struct FaqTools {
	kb: Arc<KnowledgeBase>,
	search_k: usize,
	detailed_k: usize,
}
impl FaqTools {
	pub fn new(kb: Arc<KnowledgeBase>, cfg: &faq_config::Knowledge) -> Self {
		Self { kb, search_k: cfg.search_k as usize, detailed_k: cfg.detailed_k as usize }
	}

	pub fn specs(&self) -> Vec<ToolSpec> {
		vec![
			ToolSpec {
				name: SEARCH_FAQ.to_string(),
				description: "Search the FAQ knowledge base for entries relevant to a question \
					about products, services, or policies."
					.to_string(),
				parameters: serde_json::json!({
					"type": "object",
					"properties": {
						"query": { "type": "string", "description": "Search query." }
					},
					"required": ["query"],
				}),
			},
			ToolSpec {
				name: SEARCH_DETAILED_FAQ.to_string(),
				description: "Search the FAQ knowledge base with more results. Use it when the \
					first search was not enough."
					.to_string(),
				parameters: serde_json::json!({
					"type": "object",
					"properties": {
						"query": { "type": "string", "description": "Search query." },
						"num_results": {
							"type": "integer",
							"minimum": 1,
							"description": format!("Number of entries to return (default {}).", self.detailed_k),
						}
					},
					"required": ["query"],
				}),
			},
			ToolSpec {
				name: REFORMULATE_QUERY.to_string(),
				description: "Search again with the question narrowed to one aspect, such as \
					pricing, activation, or troubleshooting."
					.to_string(),
				parameters: serde_json::json!({
					"type": "object",
					"properties": {
						"original_query": { "type": "string", "description": "The user's question." },
						"focus_aspect": { "type": "string", "description": "Aspect to focus on." }
					},
					"required": ["original_query", "focus_aspect"],
				}),
			},
		]
	}

	/// Runs one model-requested call. Unknown tools and bad arguments become error text for the
	/// model; knowledge base failures propagate.
	pub async fn call(&self, call: &ToolCall) -> Result<String> {
		let output = match call.name.as_str() {
			SEARCH_FAQ => match parse::<SearchFaqArgs>(call) {
				Ok(args) => self.search_faq(&args.query).await?,
				Err(message) => message,
			},
			SEARCH_DETAILED_FAQ => match parse::<SearchDetailedFaqArgs>(call) {
				Ok(args) => {
					let k = args.num_results.map(|n| n as usize).unwrap_or(self.detailed_k);

					self.search_detailed_faq(&args.query, k).await?
				},
				Err(message) => message,
			},
			REFORMULATE_QUERY => match parse::<ReformulateQueryArgs>(call) {
				Ok(args) => self.reformulate_query(&args.original_query, &args.focus_aspect).await?,
				Err(message) => message,
			},
			other => {
				tracing::warn!(tool = other, "Model requested an unknown tool.");

				format!("Error: unknown tool {other}.")
			},
		};

		tracing::info!(tool = %call.name, call_id = %call.id, "Tool call completed.");

		Ok(output)
	}

	pub async fn search_faq(&self, query: &str) -> Result<String> {
		let hits = self.kb.similarity_search(query, self.search_k).await?;

		if hits.is_empty() {
			return Ok(NO_FAQ_ENTRIES.to_string());
		}

		Ok(format!("Found {} relevant FAQ entries:\n\n{}", hits.len(), blocks("FAQ Entry", &hits)))
	}

	pub async fn search_detailed_faq(&self, query: &str, num_results: usize) -> Result<String> {
		let hits = self.kb.similarity_search(query, num_results).await?;

		if hits.is_empty() {
			return Ok(NO_FAQ_ENTRIES.to_string());
		}

		Ok(format!("Found {} detailed FAQ entries:\n\n{}", hits.len(), blocks("FAQ Entry", &hits)))
	}

	pub async fn reformulate_query(&self, original_query: &str, focus_aspect: &str) -> Result<String> {
		let reformulated = format!("{focus_aspect} related to {original_query}");
		let hits = self.kb.similarity_search(&reformulated, REFORMULATE_K).await?;

		if hits.is_empty() {
			return Ok(format!("No results found for aspect: {focus_aspect}"));
		}

		Ok(format!("Results for '{focus_aspect}' aspect:\n\n{}", blocks("Entry", &hits)))
	}
}

fn parse<T>(call: &ToolCall) -> std::result::Result<T, String>
where
	T: for<'de> Deserialize<'de>,
{
	let arguments = match &call.arguments {
		Value::Null => Value::Object(Default::default()),
		other => other.clone(),
	};

	serde_json::from_value(arguments).map_err(|err| {
		tracing::warn!(tool = %call.name, error = %err, "Tool arguments rejected.");

		format!("Error: invalid arguments for {}: {err}.", call.name)
	})
}

fn blocks(label: &str, hits: &[ScoredChunk]) -> String {
	hits.iter()
		.enumerate()
		.map(|(i, hit)| format!("{label} {}:\n{}", i + 1, hit.chunk.text))
		.collect::<Vec<_>>()
		.join(BLOCK_SEPARATOR)
}
