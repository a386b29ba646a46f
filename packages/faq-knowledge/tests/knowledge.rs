use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{Router, http::StatusCode, routing::get};
use tokio::net::TcpListener;

use faq_config::{Knowledge, ObjectStore};
use faq_knowledge::{ChunkingConfig, Error, FaqRecord, KnowledgeBase};
use faq_testkit::HashEmbedding;

const ROWS: [(&str, &str); 4] = [
	("How do I reset my router?", "Hold the reset button for ten seconds."),
	("What is the refund policy?", "Refunds are issued within five business days."),
	("How do I activate roaming?", "Enable roaming from the account page before travel."),
	("Which plans include unlimited data?", "The Max and Family plans include unlimited data."),
];

async fn spawn(router: Router) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub server.");
	let addr = listener.local_addr().expect("Failed to read stub address.");

	tokio::spawn(async move {
		axum::serve(listener, router).await.expect("Stub server failed.");
	});

	addr
}

fn records() -> Vec<FaqRecord> {
	ROWS.iter()
		.map(|(question, answer)| FaqRecord {
			question: question.to_string(),
			answer: answer.to_string(),
		})
		.collect()
}

fn knowledge_cfg(data_path: &Path) -> Knowledge {
	faq_testkit::sample_config(data_path).knowledge
}

async fn build(records: &[FaqRecord], embedder: Arc<HashEmbedding>) -> KnowledgeBase {
	let mut embedding = faq_testkit::sample_config(Path::new("unused.csv")).providers.embedding;

	// Wide enough that token buckets rarely collide.
	embedding.dimensions = 256;

	KnowledgeBase::from_records(
		records,
		ChunkingConfig { chunk_size: 500, chunk_overlap: 0 },
		embedding,
		embedder,
	)
	.await
	.expect("Failed to build knowledge base.")
}

#[test]
fn loads_question_answer_columns() {
	let path = faq_testkit::write_dataset(&ROWS).expect("Failed to write dataset.");
	let records = faq_knowledge::loader::load_csv(&path).expect("Failed to load dataset.");

	assert_eq!(records.len(), 4);
	assert_eq!(
		records[1].text(),
		"Q: What is the refund policy?\nA: Refunds are issued within five business days."
	);

	let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_column_is_reported() {
	let path = faq_testkit::unique_path("faq_bad_dataset", "csv");

	std::fs::write(&path, "question,reply\nQ,A\n").expect("Failed to write dataset.");

	let err = faq_knowledge::loader::load_csv(&path).expect_err("Expected missing column.");

	assert!(matches!(err, Error::MissingColumn { column: "answer", .. }), "Unexpected: {err:?}");

	let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn search_returns_at_most_k_most_similar_first() {
	let kb = build(&records(), Arc::new(HashEmbedding::default())).await;

	assert_eq!(kb.len(), 4);

	let hits = kb.similarity_search("refund policy", 2).await.expect("search failed");

	assert_eq!(hits.len(), 2);
	assert_eq!(hits[0].chunk.record_index, 1);
	assert!(hits[0].distance <= hits[1].distance);

	let all = kb.similarity_search("refund policy", 10).await.expect("search failed");

	assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn empty_index_skips_embedding() {
	let embedder = Arc::new(HashEmbedding::default());
	let kb = build(&[], embedder.clone()).await;
	let hits = kb.similarity_search("anything", 3).await.expect("search failed");

	assert!(kb.is_empty());
	assert!(hits.is_empty());
	assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn same_settings_give_same_chunks() {
	let chunking = ChunkingConfig { chunk_size: 40, chunk_overlap: 10 };
	let cfg = faq_testkit::sample_config(Path::new("unused.csv"));
	let first = KnowledgeBase::from_records(
		&records(),
		chunking,
		cfg.providers.embedding.clone(),
		Arc::new(HashEmbedding::default()),
	)
	.await
	.expect("build failed");
	let second = KnowledgeBase::from_records(
		&records(),
		chunking,
		cfg.providers.embedding,
		Arc::new(HashEmbedding::default()),
	)
	.await
	.expect("build failed");

	assert!(first.len() > records().len());
	assert_eq!(first.chunks(), second.chunks());
	assert!(first.chunks().iter().all(|chunk| chunk.text.chars().count() <= 40));
}

#[tokio::test]
async fn downloads_dataset_once_into_cache() {
	let csv = "question,answer\nHow do I pay?,By card.\n";
	let router = Router::new().route("/faq-bucket/qna.csv", get(move || async move { csv }));
	let addr = spawn(router).await;
	let cache = faq_testkit::unique_path("faq_cached_dataset", "csv");
	let mut cfg = knowledge_cfg(&cache);

	cfg.object_store = Some(ObjectStore {
		endpoint: format!("http://{addr}"),
		bucket: "faq-bucket".to_string(),
		key: "qna.csv".to_string(),
		timeout_ms: 5_000,
	});

	let path = faq_knowledge::loader::ensure_dataset(&cfg).await.expect("download failed");

	assert_eq!(path, cache);
	assert_eq!(std::fs::read_to_string(&cache).expect("Missing cache file."), csv);

	let embedder = Arc::new(HashEmbedding::default());
	let cfg_all = faq_testkit::sample_config(&cache);
	let kb = KnowledgeBase::build(&cfg, cfg_all.providers.embedding, embedder)
		.await
		.expect("build failed");

	assert_eq!(kb.len(), 1);

	let _ = std::fs::remove_file(&cache);
}

#[tokio::test]
async fn download_failure_is_fatal() {
	let router =
		Router::new().route("/faq-bucket/qna.csv", get(|| async { StatusCode::FORBIDDEN }));
	let addr = spawn(router).await;
	let mut cfg = knowledge_cfg(&faq_testkit::unique_path("faq_missing_dataset", "csv"));

	cfg.object_store = Some(ObjectStore {
		endpoint: format!("http://{addr}"),
		bucket: "faq-bucket".to_string(),
		key: "qna.csv".to_string(),
		timeout_ms: 5_000,
	});

	let err = faq_knowledge::loader::ensure_dataset(&cfg).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::Download { .. }), "Unexpected error: {err:?}");
}
