use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use mythos_engine::{
    app::{init_config, load_config, Config},
    cli::{Cli, Commands},
    models::{CompletionGateway, OpenRouterClient},
    server,
    session::SessionManager,
    telegram::{BotClient, Dispatcher},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Some(Commands::Init) = cli.command {
        return init_config();
    }

    // Load configuration
    let config: Config = if let Some(config_path) = &cli.config {
        let toml_str = std::fs::read_to_string(config_path)?;
        toml::from_str(&toml_str)?
    } else {
        load_config()?
    };

    // Credentials and endpoints are validated only by their effects; a
    // missing key fails the downstream call, not startup
    let api_key = config.openrouter_api_key()?;
    let bot_token = config.bot_token()?;
    let web_app_url = config.web_app_url()?;

    let backend =
        OpenRouterClient::with_base_url(api_key, &config.openrouter.base_url, config.generation())?;
    let gateway = CompletionGateway::new(Box::new(backend));
    let manager = Arc::new(SessionManager::new(gateway));

    let bot = Arc::new(BotClient::new(&bot_token)?);
    let dispatcher = Dispatcher::new(bot, manager, web_app_url);

    let port = resolve_port(cli.port, &config);

    // The liveness endpoint and the polling loop are independent services;
    // whichever exits first takes the process down with it
    tokio::select! {
        result = server::serve(port) => result,
        result = dispatcher.run() => result,
    }
}

/// Port precedence: CLI flag, then the PORT variable, then config
fn resolve_port(cli_port: Option<u16>, config: &Config) -> u16 {
    cli_port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(config.server.port)
}
