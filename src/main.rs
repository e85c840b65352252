use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use finch_bot::application::messaging::{Dispatcher, Router};
use finch_bot::commands;
use finch_bot::domain::entities::CommandRegistry;
use finch_bot::domain::traits::Bot;
use finch_bot::infrastructure::adapters::telegram::webhook;
use finch_bot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use finch_bot::infrastructure::config::{Settings, WebhookSettings};
use finch_bot::infrastructure::storage::ConfigStore;
use finch_bot::{BotError, ConfigError, Finch};

#[derive(Parser)]
#[command(name = "finch-bot")]
#[command(about = "A Telegram bot framework with pluggable commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path
    #[arg(short, long, default_value = "finch.yaml")]
    config: String,

    /// Bot token (overrides settings)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot, long-polling for updates
    Run {
        /// Read messages from stdin instead of Telegram
        #[arg(long)]
        console: bool,
    },
    /// Start the bot behind a webhook
    Webhook {
        /// Public base URL (overrides settings)
        #[arg(long)]
        domain: Option<String>,
        /// Path Telegram posts updates to (overrides settings)
        #[arg(long)]
        endpoint: Option<String>,
        /// Port to listen on (overrides settings)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show version
    Version,
    /// Generate default settings
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match Settings::load_or_default(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };
    if let Some(token) = cli.token {
        settings.bot.token = Some(token);
    }

    // Initialize logging
    let level = if settings.bot.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into()),
        )
        .init();

    if !Path::new(&cli.config).exists() {
        tracing::debug!("No settings at {}, using defaults", cli.config);
    }

    let result = match cli.command {
        Commands::Run { console } => block_on(async move {
            if console {
                run_console(settings).await
            } else {
                run_polling(settings).await
            }
        }),
        Commands::Webhook { domain, endpoint, port } => {
            match webhook_settings(&settings, domain, endpoint, port) {
                Ok(hook) => block_on(run_webhook(settings, hook)),
                Err(e) => Err(e.into()),
            }
        }
        Commands::Version => {
            println!("finch-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn block_on<F>(future: F) -> Result<(), BotError>
where
    F: std::future::Future<Output = Result<(), BotError>>,
{
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(future)
}

fn webhook_settings(
    settings: &Settings,
    domain: Option<String>,
    endpoint: Option<String>,
    port: Option<u16>,
) -> Result<WebhookSettings, ConfigError> {
    let base = settings.transport.webhook.clone();

    let domain = domain
        .or_else(|| base.as_ref().map(|w| w.domain.clone()))
        .ok_or_else(|| ConfigError::MissingField("transport.webhook.domain".to_string()))?;
    let endpoint = endpoint
        .or_else(|| base.as_ref().map(|w| w.endpoint.clone()))
        .unwrap_or_else(|| "/webhook".to_string());
    let listen_port = port
        .or_else(|| base.as_ref().map(|w| w.listen_port))
        .unwrap_or(8443);

    if !endpoint.starts_with('/') {
        return Err(ConfigError::InvalidValue(format!("webhook endpoint must start with '/': {}", endpoint)));
    }

    Ok(WebhookSettings {
        domain: domain.trim_end_matches('/').to_string(),
        endpoint,
        listen_port,
    })
}

/// Build the bot instance with the bundled commands and run the init phase
async fn start_finch(api: Arc<dyn Bot>, settings: &Settings) -> Arc<Finch> {
    let config = ConfigStore::load(&settings.store.path).await;
    tracing::info!("Config store at {}", config.path().display());

    let mut registry = CommandRegistry::new();
    commands::register_defaults(&mut registry);

    let finch = Arc::new(Finch::new(api, config, registry));
    let summary = finch.init_commands().await;
    if !summary.disabled.is_empty() {
        tracing::error!("Disabled commands: {}", summary.disabled.join(", "));
    }
    finch
}

async fn publish_commands(adapter: &TelegramAdapter, finch: &Finch) {
    let entries: Vec<(String, String)> = finch
        .commands()
        .helps()
        .into_iter()
        .flat_map(|help| help.botfather)
        .collect();

    if let Err(e) = adapter.set_my_commands(&entries).await {
        tracing::warn!("Failed to register commands: {}", e);
    }
}

async fn connect(settings: &Settings) -> Result<Arc<TelegramAdapter>, BotError> {
    let mut adapter = TelegramAdapter::new(settings.token()?);
    adapter.fetch_bot_info().await?;
    Ok(Arc::new(adapter))
}

async fn run_polling(settings: Settings) -> Result<(), BotError> {
    let adapter = connect(&settings).await?;
    let finch = start_finch(adapter.clone(), &settings).await;
    if settings.bot.publish_commands {
        publish_commands(&adapter, &finch).await;
    }

    let (tx, rx) = Dispatcher::channel(settings.dispatch.queue_capacity);
    let poller = tokio::spawn(adapter.clone().poll(tx, settings.transport.poll_timeout_secs));

    Dispatcher::new(Router::new(finch), settings.dispatch.max_concurrent)
        .run(rx)
        .await;

    poller
        .await
        .map_err(|e| BotError::Internal(format!("Poller task failed: {}", e)))?
}

async fn run_webhook(settings: Settings, hook: WebhookSettings) -> Result<(), BotError> {
    let adapter = connect(&settings).await?;

    let url = format!("{}{}", hook.domain, hook.endpoint);
    tracing::info!("Webhook Url: {}", url);
    adapter.set_webhook(&url).await?;

    let finch = start_finch(adapter.clone(), &settings).await;
    if settings.bot.publish_commands {
        publish_commands(&adapter, &finch).await;
    }

    let (tx, rx) = Dispatcher::channel(settings.dispatch.queue_capacity);
    let server = tokio::spawn(async move { webhook::serve(&hook.endpoint, hook.listen_port, tx).await });

    Dispatcher::new(Router::new(finch), settings.dispatch.max_concurrent)
        .run(rx)
        .await;

    server
        .await
        .map_err(|e| BotError::Internal(format!("Webhook task failed: {}", e)))?
}

async fn run_console(settings: Settings) -> Result<(), BotError> {
    tracing::info!("Starting console bot (dev mode)");

    let adapter = Arc::new(ConsoleAdapter::new());
    let finch = start_finch(adapter.clone(), &settings).await;

    let (tx, rx) = Dispatcher::channel(settings.dispatch.queue_capacity);
    let reader = tokio::spawn(async move {
        adapter.read_updates(BufReader::new(tokio::io::stdin()), tx).await
    });

    Dispatcher::new(Router::new(finch), settings.dispatch.max_concurrent)
        .run(rx)
        .await;

    reader
        .await
        .map_err(|e| BotError::Internal(format!("Console reader failed: {}", e)))?
        .map_err(|e| BotError::Internal(format!("Failed to read stdin: {}", e)))
}

fn init_config(path: &str) -> Result<(), BotError> {
    if Path::new(path).exists() {
        return Err(ConfigError::InvalidValue(format!("{} already exists", path)).into());
    }

    let yaml = serde_yaml::to_string(&Settings::default())
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    std::fs::write(path, yaml)
        .map_err(|e| BotError::Internal(format!("Failed to write {}: {}", path, e)))?;

    println!("Wrote default settings to {}", path);
    Ok(())
}
