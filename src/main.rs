use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use hinko::application::errors::BotError;
use hinko::application::messaging::CommandDispatcher;
use hinko::application::services::MessageService;
use hinko::domain::traits::{Bot, Store};
use hinko::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use hinko::infrastructure::ascii::HttpAsciiRenderer;
use hinko::infrastructure::config::Config;
use hinko::infrastructure::database::SqliteStore;

#[derive(Parser)]
#[command(name = "hinko")]
#[command(about = "A chat bot for small teams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => tokio::runtime::Runtime::new()
            .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))
            .and_then(|rt| rt.block_on(run_bot(&cli.config, cli.token))),
        Commands::Version => {
            println!("hinko v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Result<Config, BotError> {
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path)?
    } else {
        tracing::info!("{} not found, using defaults", config_path);
        Config::default()
    };
    config.apply_env();
    if let Some(token) = token_override {
        config.set_token(token);
    }
    config.validate()?;
    Ok(config)
}

async fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(config_path, token_override)?;
    tracing::info!("Starting {}", config.bot.name);

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config.storage.path)?);
    tracing::info!("Database opened at {}", config.storage.path.display());

    let bot: Arc<dyn Bot> = match config.telegram_token() {
        Some(token) => Arc::new(TelegramAdapter::connect(token).await?),
        None => {
            tracing::info!("No Telegram token, starting console bot (dev mode)");
            Arc::new(ConsoleAdapter::new())
        }
    };
    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let renderer = HttpAsciiRenderer::new(config.ascii)
        .map_err(|e| BotError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let renderer = Arc::new(renderer);
    let dispatcher = CommandDispatcher::new(store.clone(), bot.clone(), renderer)?
        .with_reserved_groups(config.groups.clone())
        .with_animation(config.animation.clone());
    let service = MessageService::new(bot, dispatcher).with_reactions(config.reactions.clone());

    let outcome = tokio::select! {
        result = service.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    };

    if let Err(e) = store.close().await {
        tracing::error!("Failed to close database: {}", e);
    }
    match outcome {
        // console input running out is a normal way to stop
        Err(BotError::Closed(reason)) => {
            tracing::info!("Stopped: {}", reason);
            Ok(())
        }
        other => other,
    }
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
