//! Command-line plumbing shared by the FAQ binaries.

use std::{fs, path::PathBuf};

use clap::{
	Args,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre::{self, WrapErr};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LOG_FILE_NAME: &str = "app.log";

#[derive(Debug, Args)]
pub struct ConfigArgs {
	/// Path to the TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Installs the global subscriber: console output always, plus `<log_dir>/app.log` when a log
/// directory is configured.
pub fn init_tracing(service: &faq_config::Service) -> color_eyre::Result<()> {
	let filter = || EnvFilter::try_new(&service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	let console = fmt::layer().with_target(true).with_filter(filter());
	let file = match service.log_dir.as_ref() {
		Some(dir) => {
			fs::create_dir_all(dir)
				.wrap_err_with(|| format!("Failed to create log directory at {dir:?}."))?;

			let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);

			Some(fmt::layer().with_ansi(false).with_writer(appender).with_filter(filter()))
		},
		None => None,
	};

	tracing_subscriber::registry()
		.with(console)
		.with(file)
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to install tracing subscriber: {err}"))?;

	Ok(())
}
