use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = faq_runtime::Args::parse();

	faq_runtime::run(args).await
}
