use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chatrelay",
    version,
    about = "Streaming chat backend for mock and OpenAI-compatible models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeOpts),
    /// Print the models the server would offer.
    Models,
    Version,
}

#[derive(clap::Args, Debug, Default)]
pub struct ServeOpts {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Allowed CORS origin; repeat for several.
    #[arg(long = "cors-origin")]
    pub cors_origin: Vec<String>,
    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}
