pub mod routes;
pub mod state;

use std::net::SocketAddr;

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
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = faq_config::load(&args.config.config, Profile::Runtime)?;

	faq_cli::init_tracing(&config.service)?;

	let addr: SocketAddr = config.service.runtime_bind.parse()?;
	let eager = config.agent.eager_init;
	let state = AppState::new(config);

	if eager {
		state.agent.get().await?;

		tracing::info!("Agent initialized at startup.");
	}

	let app = routes::router(state);
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(%addr, "Agent runtime listening.");

	axum::serve(listener, app).await?;

	Ok(())
}
