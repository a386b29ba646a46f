use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = faq_web::Args::parse();

	faq_web::run(args).await
}
