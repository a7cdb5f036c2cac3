use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Book catalogue service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API until SIGINT/SIGTERM (default)
    Serve,
    /// Print the resolved configuration and exit
    Config,
    /// Serve the HTTP API inside the AWS Lambda runtime
    #[cfg(feature = "lambda")]
    Lambda,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            println!("{:#?}", settings);
            println!("configuration is valid");
            Ok(())
        }
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "shelf serve starting");
            shelf_app::run(settings).await
        }
        #[cfg(feature = "lambda")]
        Command::Lambda => {
            shelf_telemetry::init(&settings.telemetry)?;
            run_lambda(settings).await
        }
    }
}

#[cfg(feature = "lambda")]
async fn run_lambda(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(env = ?settings.environment, "shelf lambda starting");

    let (registry, app) = shelf_app::prepare(&settings).await?;
    let served = lambda_http::run(app)
        .await
        .map_err(|e| anyhow::anyhow!("lambda runtime failed: {e}"));

    registry.stop_all().await?;
    served
}
