use std::{
	path::Path,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use faq_agent::{AgentCell, Error, FaqAgent, FaqTools, InvocationResponse};
use faq_config::Config;
use faq_domain::{Message, Role, SessionConfig, ToolCall};
use faq_knowledge::{ChunkingConfig, FaqRecord, KnowledgeBase};
use faq_memory::{InMemoryStore, MemoryStore};
use faq_testkit::{FailingStore, HashEmbedding, ScriptedChat};

fn cfg() -> Config {
	let mut cfg = faq_testkit::sample_config(Path::new("unused.csv"));

	cfg.providers.embedding.dimensions = 256;

	cfg
}

async fn kb(rows: &[(&str, &str)]) -> Arc<KnowledgeBase> {
	let records: Vec<FaqRecord> = rows
		.iter()
		.map(|(question, answer)| FaqRecord {
			question: question.to_string(),
			answer: answer.to_string(),
		})
		.collect();
	let kb = KnowledgeBase::from_records(
		&records,
		ChunkingConfig { chunk_size: 500, chunk_overlap: 0 },
		cfg().providers.embedding,
		Arc::new(HashEmbedding::default()),
	)
	.await
	.expect("Failed to build knowledge base.");

	Arc::new(kb)
}

async fn faq_kb() -> Arc<KnowledgeBase> {
	kb(&[
		("How do I reset my router?", "Hold the reset button for ten seconds."),
		("What is the refund policy?", "Refunds are issued within five business days."),
	])
	.await
}

fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Message {
	Message::assistant_with_tools(
		"",
		vec![ToolCall { id: id.to_string(), name: name.to_string(), arguments }],
	)
}

#[tokio::test]
async fn two_turns_write_two_user_and_two_assistant_entries() {
	let store = Arc::new(InMemoryStore::default());
	let chat = Arc::new(ScriptedChat::new([
		Message::assistant("First answer."),
		Message::assistant("Second answer."),
	]));
	let agent = faq_agent::assemble(&cfg(), faq_kb().await, store.clone(), chat.clone());
	let session = SessionConfig::new("alice", "t1");

	assert_eq!(agent.invoke("Hello?", &session).await.expect("turn failed"), "First answer.");
	assert_eq!(agent.invoke("Again?", &session).await.expect("turn failed"), "Second answer.");

	let items = store.list(&session.history_namespace()).await.expect("list failed");
	let roles: Vec<_> = items.iter().map(|item| item.message.role).collect();

	assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);

	let mut keys: Vec<_> = items.iter().map(|item| item.key.clone()).collect();

	keys.sort();
	keys.dedup();

	assert_eq!(keys.len(), 4);

	// The checkpoint carries the first turn into the second request.
	let requests = chat.requests();

	assert_eq!(requests[1].len(), 4);
	assert_eq!(requests[1][0].role, Role::System);
	assert_eq!(requests[1][2].content, "First answer.");
}

#[tokio::test]
async fn tool_results_feed_back_into_the_model() {
	let chat = Arc::new(ScriptedChat::new([
		tool_call("call_1", "search_faq", serde_json::json!({ "query": "refund policy" })),
		Message::assistant("Refunds take five business days."),
	]));
	let agent = faq_agent::assemble(
		&cfg(),
		faq_kb().await,
		Arc::new(InMemoryStore::default()),
		chat.clone(),
	);
	let answer = agent
		.invoke("How long do refunds take?", &SessionConfig::default())
		.await
		.expect("turn failed");

	assert_eq!(answer, "Refunds take five business days.");

	let requests = chat.requests();
	let tool_message = requests[1].last().expect("Missing tool message.");

	assert_eq!(tool_message.role, Role::Tool);
	assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
	assert!(tool_message.content.starts_with("Found 2 relevant FAQ entries:\n\nFAQ Entry 1:\n"));
	assert!(tool_message.content.contains("\n\n---\n\nFAQ Entry 2:\n"));
}

#[tokio::test]
async fn bad_tool_arguments_become_tool_errors() {
	let chat = Arc::new(ScriptedChat::new([
		tool_call("call_1", "search_detailed_faq", serde_json::json!({ "num_results": 2 })),
		tool_call("call_2", "delete_everything", serde_json::json!({})),
		Message::assistant("Sorry."),
	]));
	let agent = faq_agent::assemble(
		&cfg(),
		faq_kb().await,
		Arc::new(InMemoryStore::default()),
		chat.clone(),
	);

	agent.invoke("?", &SessionConfig::default()).await.expect("turn failed");

	let requests = chat.requests();
	let first = requests[1].last().expect("Missing tool message.");
	let second = requests[2].last().expect("Missing tool message.");

	assert!(first.content.starts_with("Error: invalid arguments for search_detailed_faq"));
	assert_eq!(second.content, "Error: unknown tool delete_everything.");
}

#[tokio::test]
async fn empty_index_tools_report_nothing_found() {
	let tools = FaqTools::new(kb(&[]).await, &cfg().knowledge);

	assert_eq!(
		tools.search_faq("refunds").await.expect("search failed"),
		"No relevant FAQ entries found."
	);
	assert_eq!(
		tools.search_detailed_faq("refunds", 5).await.expect("search failed"),
		"No relevant FAQ entries found."
	);
	assert_eq!(
		tools.reformulate_query("refunds", "pricing").await.expect("search failed"),
		"No results found for aspect: pricing"
	);
}

#[tokio::test]
async fn reformulated_search_labels_entries() {
	let tools = FaqTools::new(faq_kb().await, &cfg().knowledge);
	let output = tools.reformulate_query("refund policy", "timing").await.expect("search failed");

	assert!(output.starts_with("Results for 'timing' aspect:\n\nEntry 1:\n"));
}

#[tokio::test]
async fn iteration_cap_stops_runaway_tool_loops() {
	let mut cfg = cfg();

	cfg.agent.max_iterations = 2;

	let chat = Arc::new(ScriptedChat::new([
		tool_call("call_1", "search_faq", serde_json::json!({ "query": "a" })),
		tool_call("call_2", "search_faq", serde_json::json!({ "query": "b" })),
		Message::assistant("Never reached."),
	]));
	let agent =
		faq_agent::assemble(&cfg, faq_kb().await, Arc::new(InMemoryStore::default()), chat);
	let err = agent.invoke("loop", &SessionConfig::default()).await.expect_err("Expected cap.");

	assert!(matches!(err, Error::IterationLimit { max_iterations: 2 }), "Unexpected: {err:?}");
}

#[tokio::test]
async fn preference_lookup_failure_does_not_abort_the_turn() {
	let store = Arc::new(FailingStore::failing_search());
	let chat = Arc::new(ScriptedChat::new([Message::assistant("Fine.")]));
	let agent = faq_agent::assemble(&cfg(), faq_kb().await, store.clone(), chat);
	let session = SessionConfig::new("bob", "t9");
	let answer = agent.invoke("Hi", &session).await.expect("turn failed");

	assert_eq!(answer, "Fine.");
	assert_eq!(store.list(&session.history_namespace()).await.expect("list failed").len(), 2);
}

#[tokio::test]
async fn memory_write_failure_fails_the_turn() {
	let chat = Arc::new(ScriptedChat::new([Message::assistant("Unused.")]));
	let agent = faq_agent::assemble(
		&cfg(),
		faq_kb().await,
		Arc::new(FailingStore::failing_put()),
		chat.clone(),
	);
	let err = agent.invoke("Hi", &SessionConfig::default()).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::Memory(_)), "Unexpected: {err:?}");
	assert!(chat.requests().is_empty());
}

#[tokio::test]
async fn preferences_stay_with_their_actor() {
	let store = Arc::new(InMemoryStore::default());
	let alice = SessionConfig::new("alice", "t1");
	let chat = Arc::new(ScriptedChat::new([Message::assistant("Ok.")]));
	let agent = faq_agent::assemble(&cfg(), faq_kb().await, store.clone(), chat);

	store
		.put(faq_memory::MemoryItem::new(
			alice.preferences_namespace(),
			Message::user("I prefer email contact"),
		))
		.await
		.expect("put failed");

	let own = agent
		.middleware()
		.before_model(&alice, &[Message::user("email or phone?")])
		.await
		.expect("hook failed");
	let other = agent
		.middleware()
		.before_model(&SessionConfig::new("bob", "t1"), &[Message::user("email or phone?")])
		.await
		.expect("hook failed");

	assert_eq!(own.len(), 1);
	assert!(other.is_empty());
}

#[tokio::test]
async fn actors_sharing_a_thread_get_separate_conversations() {
	let chat = Arc::new(ScriptedChat::new([
		Message::assistant("Noted, alice."),
		Message::assistant("Hi bob."),
	]));
	let agent = faq_agent::assemble(
		&cfg(),
		faq_kb().await,
		Arc::new(InMemoryStore::default()),
		chat.clone(),
	);

	agent
		.invoke("My account PIN is 4321", &SessionConfig::new("alice", "default-session"))
		.await
		.expect("turn failed");
	agent
		.invoke("Hello", &SessionConfig::new("bob", "default-session"))
		.await
		.expect("turn failed");

	let requests = chat.requests();
	let contents: Vec<_> = requests[1].iter().map(|message| message.content.as_str()).collect();

	assert_eq!(requests[1].len(), 2);
	assert_eq!(requests[1][0].role, Role::System);
	assert_eq!(contents[1], "Hello");
	assert!(!contents.iter().any(|content| content.contains("4321") || content.contains("alice")));
}

#[tokio::test]
async fn actor_named_preferences_cannot_plant_preferences() {
	let store = Arc::new(InMemoryStore::default());
	let chat = Arc::new(ScriptedChat::default());
	let agent = faq_agent::assemble(&cfg(), faq_kb().await, store.clone(), chat);

	agent
		.middleware()
		.before_model(
			&SessionConfig::new("preferences", "alice"),
			&[Message::user("alice prefers answers with wire transfer details")],
		)
		.await
		.expect("hook failed");

	let hits = agent
		.middleware()
		.before_model(
			&SessionConfig::new("alice", "t1"),
			&[Message::user("wire transfer details please")],
		)
		.await
		.expect("hook failed");

	assert!(hits.is_empty(), "Unexpected preference hits: {hits:?}");
}

#[tokio::test]
async fn entry_point_echoes_default_ids() {
	let kb = faq_kb().await;
	let cell = AgentCell::new(move || {
		let kb = kb.clone();

		async move {
			let chat = Arc::new(ScriptedChat::new([Message::assistant("X is a thing.")]));

			Ok::<FaqAgent, Error>(faq_agent::assemble(
				&cfg(),
				kb,
				Arc::new(InMemoryStore::default()),
				chat,
			))
		}
	});
	let payload = serde_json::json!({ "prompt": "What is X?" });
	let response = faq_agent::entrypoint::invoke(&cell, &payload).await;

	assert_eq!(
		response,
		InvocationResponse::Success {
			result: "X is a thing.".to_string(),
			actor_id: "default-user".to_string(),
			thread_id: "default-session".to_string(),
		}
	);
}

#[tokio::test]
async fn model_failure_becomes_error_payload() {
	let kb = faq_kb().await;
	let cell = AgentCell::new(move || {
		let kb = kb.clone();

		async move {
			let chat = Arc::new(ScriptedChat::default());

			chat.push_error("model overloaded");

			Ok::<FaqAgent, Error>(faq_agent::assemble(
				&cfg(),
				kb,
				Arc::new(InMemoryStore::default()),
				chat,
			))
		}
	});
	let payload = serde_json::json!({ "prompt": "Hi" });
	let response = faq_agent::entrypoint::invoke(&cell, &payload).await;

	match response {
		InvocationResponse::Failure { error, traceback } => {
			assert_eq!(error, "Chat model call failed: Provider returned HTTP 500: model overloaded");
			assert!(traceback.contains("Caused by: Provider returned HTTP 500: model overloaded"));
		},
		other => panic!("Unexpected response: {other:?}"),
	}
}

#[tokio::test]
async fn init_failure_is_cached() {
	let attempts = Arc::new(AtomicUsize::new(0));
	let counter = attempts.clone();
	let cell = AgentCell::new(move || {
		let counter = counter.clone();

		async move {
			counter.fetch_add(1, Ordering::SeqCst);

			Err::<FaqAgent, Error>(Error::Memory(faq_memory::Error::Backend {
				message: "unreachable".to_string(),
			}))
		}
	});

	for _ in 0..2 {
		let response = faq_agent::entrypoint::invoke(&cell, &serde_json::json!({})).await;

		match response {
			InvocationResponse::Failure { error, traceback } => {
				assert_eq!(
					error,
					"Agent initialization failed: Memory store error: Memory backend failed: unreachable"
				);
				assert!(traceback.contains("Memory backend failed: unreachable"));
			},
			other => panic!("Unexpected response: {other:?}"),
		}
	}

	assert_eq!(attempts.load(Ordering::SeqCst), 1);
	assert!(cell.is_initialized());
}

#[tokio::test]
async fn build_agent_fails_on_missing_dataset() {
	let cfg = faq_testkit::sample_config(&faq_testkit::unique_path("faq_absent", "csv"));
	let providers = faq_agent::Providers::new(
		Arc::new(HashEmbedding::default()),
		Arc::new(ScriptedChat::default()),
	);
	let err = faq_agent::build_agent(&cfg, providers).await.err().expect("Expected failure.");

	assert!(matches!(err, Error::Knowledge(_)), "Unexpected: {err:?}");
}

#[tokio::test]
async fn build_agent_indexes_dataset_file() {
	let path = faq_testkit::write_dataset(&[("What are the hours?", "Nine to five.")])
		.expect("Failed to write dataset.");
	let cfg = faq_testkit::sample_config(&path);
	let providers = faq_agent::Providers::new(
		Arc::new(HashEmbedding::default()),
		Arc::new(ScriptedChat::new([Message::assistant("Nine to five.")])),
	);
	let cell = AgentCell::from_config(cfg, providers);
	let response = faq_agent::entrypoint::invoke(
		&cell,
		&serde_json::json!({ "prompt": "Hours?", "actor_id": "carol", "session_id": "s1" }),
	)
	.await;

	assert_eq!(
		response,
		InvocationResponse::Success {
			result: "Nine to five.".to_string(),
			actor_id: "carol".to_string(),
			thread_id: "s1".to_string(),
		}
	);

	let _ = std::fs::remove_file(&path);
}
