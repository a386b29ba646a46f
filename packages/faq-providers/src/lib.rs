pub mod chat;
pub mod embedding;

mod error;

pub use chat::ToolSpec;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin, time::Duration};

use reqwest::{
	Client, Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use faq_config::{EmbeddingProviderConfig, LlmProviderConfig};
use faq_domain::Message;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	/// One model call. The returned message is always an assistant message, possibly carrying
	/// tool calls.
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Message],
		tools: &'a [ToolSpec],
	) -> BoxFuture<'a, Result<Message>>;
}

/// OpenAI-compatible HTTP providers sharing one connection pool.
#[derive(Clone, Debug, Default)]
pub struct HttpProviders {
	client: Client,
}
impl HttpProviders {
	pub fn new(client: Client) -> Self {
		Self { client }
	}
}
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(&self.client, cfg, texts))
	}
}
impl ChatProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Message],
		tools: &'a [ToolSpec],
	) -> BoxFuture<'a, Result<Message>> {
		Box::pin(chat::complete(&self.client, cfg, messages, tools))
	}
}

/// Bearer auth plus configured extra headers. A blank key sends no `Authorization` header, which
/// is what self-hosted embedding servers expect.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if !api_key.trim().is_empty() {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) async fn post_json(
	client: &Client,
	url: String,
	headers: HeaderMap,
	timeout_ms: u64,
	body: &Value,
) -> Result<Value> {
	let res = client
		.post(url)
		.headers(headers)
		.timeout(Duration::from_millis(timeout_ms))
		.json(body)
		.send()
		.await?;

	read_json(res).await
}

async fn read_json(res: Response) -> Result<Value> {
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	Ok(res.json().await?)
}
