pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use faq_config::Profile;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = faq_cli::VERSION,
	rename_all = "kebab",
	styles = faq_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: faq_cli::ConfigArgs,
	/// Directory served at `/`.
	#[arg(long, value_name = "DIR", default_value = "frontend")]
	pub static_dir: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = faq_config::load(&args.config.config, Profile::Web)?;

	faq_cli::init_tracing(&config.service)?;

	let addr: SocketAddr = config.service.web_bind.parse()?;

	if config.runtime.agent_runtime_arn.is_empty() {
		tracing::warn!("Agent runtime ARN is not set. Chat requests will be rejected.");
	}

	let state = AppState::new(config.runtime)?;
	let app = routes::router(state, &args.static_dir);
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(%addr, static_dir = %args.static_dir.display(), "Web proxy listening.");

	axum::serve(listener, app).await?;

	Ok(())
}
