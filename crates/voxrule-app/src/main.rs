//! Voxrule binary - composition root.
//!
//! `serve` (the default):
//! 1. Load configuration from TOML
//! 2. Open the rule store and the API token
//! 3. Build the dispatcher and rule engine
//! 4. Start the admin API, and optionally the execution service
//! 5. Run the dispatch loop over console input until Ctrl-C
//!
//! `runner` starts the isolated process execution service on its own.

mod cli;
mod console;
mod session;

use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::watch;

use voxrule_action::{DeviceHandle, Dispatcher, RuleEngine};
use voxrule_core::VoxruleConfig;
use voxrule_storage::RuleStore;

use crate::cli::{CliArgs, Command};
use crate::console::ConsoleDevice;
use crate::session::Session;

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Resolves once the watch flips to `true`.
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Forward stdin lines to the console device until EOF.
async fn read_console(device: Arc<ConsoleDevice>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                device.feed_line(&line);
            }
            Ok(None) => {
                tracing::info!("Console input closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read console input");
                break;
            }
        }
    }
}

async fn serve(
    config: VoxruleConfig,
    port: Option<u16>,
    with_runner: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config.data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let store = Arc::new(RuleStore::open(&config.rules_path(), &config.settings_path())?);
    tracing::info!(
        path = %config.rules_path().display(),
        rules = store.list().map(|r| r.len()).unwrap_or(0),
        "Rule store opened"
    );

    let token = voxrule_api::auth::load_or_generate_token(&config.token_path())?;
    let dispatcher = Dispatcher::new(&config.engine, &config.terminal)?;
    let engine = RuleEngine::new(Arc::clone(&store), dispatcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // === Admin API ===
    let env_port = std::env::var(voxrule_api::routes::PORT_ENV).ok();
    let api_port = voxrule_api::resolve_port(env_port.as_deref(), port, config.api.port);
    let api_state = voxrule_api::AppState::new(Arc::clone(&store), token, api_port);
    let api_host = config.api.host.clone();
    let api_shutdown = wait_for_shutdown(shutdown_rx.clone());
    let api_task = tokio::spawn(async move {
        if let Err(e) = voxrule_api::start_server(&api_host, api_state, api_shutdown).await {
            tracing::error!(error = %e, "Admin API stopped");
        }
    });

    // === Execution service ===
    let runner_task = with_runner.then(|| {
        let runner_config = config.runner.clone();
        let runner_shutdown = wait_for_shutdown(shutdown_rx.clone());
        tokio::spawn(async move {
            if let Err(e) = voxrule_runner::start_server(&runner_config, runner_shutdown).await {
                tracing::error!(error = %e, "Runner stopped");
            }
        })
    });

    // === Dispatch loop ===
    let device = Arc::new(ConsoleDevice::stdout());
    let events = device.subscribe();
    let handle: Arc<dyn DeviceHandle> = device.clone();
    let session_task = tokio::spawn(Session::new(engine, handle).run(events));
    let console_task = tokio::spawn(read_console(Arc::clone(&device)));

    tracing::info!("Voxrule running, type an utterance and press Enter. Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    console_task.abort();
    session_task.abort();
    let _ = api_task.await;
    if let Some(task) = runner_task {
        let _ = task.await;
    }
    Ok(())
}

async fn run_runner(config: VoxruleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        let _ = shutdown_tx.send(true);
    });
    voxrule_runner::start_server(&config.runner, wait_for_shutdown(shutdown_rx)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    // Config is read before tracing so its log level can seed the filter.
    let config_file = cli.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match VoxruleConfig::load(&config_file) {
            Ok(config) => (config, None),
            Err(e) => (VoxruleConfig::default(), Some(e)),
        }
    } else {
        (VoxruleConfig::default(), None)
    };
    cli.apply_overrides(&mut config);
    init_tracing(&config.general.log_level);

    tracing::info!("Starting Voxrule v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::info!(path = %config_file.display(), "Configuration resolved"),
    }

    match cli.command() {
        Command::Serve { port, with_runner } => serve(config, port, with_runner).await,
        Command::Runner { .. } => run_runner(config).await,
    }
}
