use std::sync::Arc;

use reqwest::Client;

use faq_config::Runtime;

#[derive(Clone)]
pub struct AppState {
	pub client: Client,
	pub runtime: Arc<Runtime>,
}
impl AppState {
	pub fn new(runtime: Runtime) -> color_eyre::Result<Self> {
		let client = Client::builder().build()?;

		Ok(Self { client, runtime: Arc::new(runtime) })
	}
}
