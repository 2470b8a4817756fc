pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(about = "Back office API - resource administration server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides BACKOFFICE_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Mint a signed bearer token for local use")]
    Token {
        #[arg(long, help = "Subject id")]
        sub: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Role claim, e.g. admin")]
        role: Option<String>,
        #[arg(long, help = "Hours until expiry (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Token { sub, email, role, hours } => {
            commands::token::handle(config, sub, email, role, hours, cli.json)
        }
    }
}
