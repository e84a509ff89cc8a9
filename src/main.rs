use chatrelay::cli::{Cli, Commands};
use chatrelay::config::{Config, LogFormat};
use chatrelay::gateway::GatewayServer;
use chatrelay::logging;
use chatrelay::models::ModelRegistry;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            let config = Config::from_env()?;
            let format = if opts.log_json {
                LogFormat::Json
            } else {
                config.logging.format
            };
            logging::init(format);

            info!("Starting chatrelay server");
            let server = GatewayServer::start(config, &opts)?;
            server.run_until_shutdown().await?;
        }
        Commands::Models => {
            let config = Config::from_env()?;
            let registry = ModelRegistry::from_config(&config);
            println!("{}", serde_json::to_string_pretty(registry.items())?);
        }
        Commands::Version => {
            println!("chatrelay {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
