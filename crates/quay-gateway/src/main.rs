//! # quay-gateway
//!
//! Gateway server binary — wires the runtime coordinators, RPC registry,
//! and HTTP/WebSocket server together and runs until a shutdown signal.
//!
//! A restart request is an exit with a distinguished code: the process
//! supervisor sees [`RESTART_EXIT_CODE`] and relaunches the gateway.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use quay_logging::LogFormat;
use quay_runtime::{
    EventSink, NativePtySpawner, PtySpawner, RestartCoordinator, RestartRequester,
    TerminalManager, WizardFlag, WizardGate,
};
use quay_server::config::ServerConfig;
use quay_server::rpc::context::RpcContext;
use quay_server::rpc::handlers::system::{HealthHandler, PingHandler};
use quay_server::rpc::handlers::terminal::{
    CloseTerminalHandler, OpenTerminalHandler, TerminalInputHandler, TerminalResizeHandler,
};
use quay_server::rpc::registry::MethodRegistry;
use quay_server::server::GatewayServer;
use quay_server::shutdown::ShutdownCoordinator;
use quay_server::websocket::broadcast::BroadcastManager;
use quay_server::websocket::event_bridge::BroadcastSink;

/// Exit code that tells the supervisor to relaunch the gateway.
const RESTART_EXIT_CODE: u8 = 7;

/// Quay gateway server.
#[derive(Parser, Debug)]
#[command(name = "quayd", about = "Quay gateway server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified, 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings JSON file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log output format.
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

/// Restart requester backed by the process supervisor contract: initiate
/// a drain now, exit with the restart code afterwards.
struct SupervisorRestart {
    shutdown: Arc<ShutdownCoordinator>,
}

impl RestartRequester for SupervisorRestart {
    fn request_restart(&self) {
        self.shutdown.request_restart_exit();
    }
}

/// Register every RPC method the gateway serves.
fn build_registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register("terminal.open", OpenTerminalHandler);
    registry.register("terminal.input", TerminalInputHandler);
    registry.register("terminal.resize", TerminalResizeHandler);
    registry.register("terminal.close", CloseTerminalHandler);
    registry.register("system.ping", PingHandler);
    registry.register("system.health", HealthHandler);
    registry
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Settings first: the bind address and idle window come from them.
    let settings_path = args
        .settings
        .unwrap_or_else(quay_settings::loader::settings_path);
    let mut settings = quay_settings::loader::load_settings_from_path(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    if let Err(e) = quay_logging::init(args.log_format, "info") {
        eprintln!("failed to initialize logging: {e}");
    }
    let metrics_handle = quay_server::metrics::install_recorder();

    // Shared plumbing.
    let shutdown = Arc::new(ShutdownCoordinator::new());
    let broadcast = Arc::new(BroadcastManager::new());
    let sink: Arc<dyn EventSink> = Arc::new(BroadcastSink::new(broadcast.clone()));

    // Terminal session manager.
    let spawner: Arc<dyn PtySpawner> = Arc::new(NativePtySpawner::new(&settings.terminal));
    let terminal = Arc::new(TerminalManager::new(
        spawner,
        sink,
        Duration::from_secs(settings.terminal.idle_timeout_secs),
    ));

    // Restart coordination.
    let wizard = Arc::new(WizardFlag::new());
    let gate: Arc<dyn WizardGate> = wizard.clone();
    let requester: Arc<dyn RestartRequester> = Arc::new(SupervisorRestart {
        shutdown: shutdown.clone(),
    });
    let restart = Arc::new(RestartCoordinator::new(gate, requester));

    let context = Arc::new(RpcContext {
        terminal: terminal.clone(),
        restart,
        wizard,
        broadcast,
        settings: settings.clone(),
        server_start_time: Instant::now(),
        shutdown: shutdown.clone(),
    });

    let registry = build_registry();
    let method_count = registry.methods().len();
    let config = ServerConfig::from_settings(&settings.server);
    let server = GatewayServer::new(config, registry, context, Some(metrics_handle));

    tracing::info!(
        host = %settings.server.host,
        port = settings.server.port,
        method_count,
        "starting gateway"
    );

    let (server_err_tx, server_err_rx) = tokio::sync::oneshot::channel::<std::io::Error>();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            let _ = server_err_tx.send(e);
        }
    });

    // Run until a signal arrives, the server fails, or a restart drains
    // the token.
    let token = shutdown.token();
    let mut server_err = None;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            tracing::info!("interrupt received, shutting down");
        }
        _ = sigterm() => {
            tracing::info!("termination signal received, shutting down");
        }
        err = server_err_rx => {
            server_err = err.ok();
        }
        () = token.cancelled() => {
            // Restart path: the coordinator already started the drain.
        }
    }

    shutdown.graceful_shutdown(vec![server_task], None).await;

    if let Some(e) = server_err {
        return Err(e).context("server error");
    }

    if shutdown.restart_requested() {
        tracing::info!(code = RESTART_EXIT_CODE, "exiting for supervisor restart");
        return Ok(ExitCode::from(RESTART_EXIT_CODE));
    }
    tracing::info!("shutdown complete");
    Ok(ExitCode::SUCCESS)
}

/// Wait for SIGTERM (never resolves on non-unix hosts).
async fn sigterm() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                let _ = stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
