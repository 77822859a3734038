//! `GatewayServer` — Axum HTTP + WebSocket server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use quay_core::ConnectionId;
use quay_runtime::WizardGate;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics::{WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL};
use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::BroadcastManager;
use crate::websocket::connection::{ClientConnection, OutboundMessage};
use crate::websocket::handler::handle_message;
use crate::websocket::heartbeat::{HeartbeatResult, run_heartbeat};

/// Per-connection outbound channel depth.
const OUTBOUND_CHANNEL_DEPTH: usize = 256;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// RPC method registry.
    pub registry: Arc<MethodRegistry>,
    /// Handler context.
    pub context: Arc<RpcContext>,
    /// Broadcast manager for event fan-out.
    pub broadcast: Arc<BroadcastManager>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: ServerConfig,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle (None when metrics are not installed).
    pub metrics: Option<PrometheusHandle>,
}

/// The gateway's HTTP + WebSocket server.
pub struct GatewayServer {
    config: ServerConfig,
    registry: Arc<MethodRegistry>,
    context: Arc<RpcContext>,
    metrics: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new server.
    ///
    /// The broadcast manager and shutdown coordinator are taken from the
    /// context so RPC handlers and HTTP routes observe the same instances.
    pub fn new(
        config: ServerConfig,
        registry: MethodRegistry,
        context: Arc<RpcContext>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            context,
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            context: self.context.clone(),
            broadcast: self.context.broadcast.clone(),
            shutdown: self.context.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.context.server_start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .with_state(state)
    }

    /// Bind and serve until shutdown is requested.
    ///
    /// After the listener drains, the terminal manager is torn down so no
    /// shell process outlives the gateway.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local = listener.local_addr()?;
        info!(addr = %local, "gateway listening");

        let context = self.context.clone();
        let token = context.shutdown.token();
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await?;

        context.terminal.shutdown().await;
        info!("gateway stopped");
        Ok(())
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the method registry.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.broadcast.connection_count(),
        state.context.terminal.active_session_id().await.is_some(),
        state.context.restart.restart_pending(),
        state.context.wizard.is_setup_wizard_active(),
    );
    Json(resp)
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => crate::metrics::render(&handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /ws — WebSocket upgrade.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if state.broadcast.connection_count() >= state.config.max_connections {
        warn!(
            max = state.config.max_connections,
            "connection limit reached, rejecting upgrade"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| client_loop(state, socket))
}

/// Drive one client connection to completion.
async fn client_loop(state: AppState, socket: WebSocket) {
    let conn_id = ConnectionId::new();
    let (out_tx, mut out_rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_CHANNEL_DEPTH);
    let connection = Arc::new(ClientConnection::new(conn_id.to_string(), out_tx));
    state.broadcast.add(connection.clone());
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(conn_id = %conn_id, "client connected");

    let cancel = state.shutdown.token().child_token();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: everything outbound flows through one channel so the
    // broadcast path never touches the socket directly.
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = writer_cancel.cancelled() => break,
                msg = out_rx.recv() => match msg {
                    Some(OutboundMessage::Text(text)) => {
                        if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(OutboundMessage::Ping) => {
                        if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        let _ = ws_tx.close().await;
    });

    // Heartbeat task: closes the connection when the client goes silent.
    let hb_conn = connection.clone();
    let hb_cancel = cancel.clone();
    let hb_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let hb_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    let hb_token = cancel.clone();
    let heartbeat = tokio::spawn(async move {
        if run_heartbeat(hb_conn, hb_interval, hb_timeout, hb_cancel).await
            == HeartbeatResult::TimedOut
        {
            warn!("client heartbeat timed out");
            hb_token.cancel();
        }
    });

    // Read loop.
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            msg = ws_rx.next() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        connection.mark_alive();
                        let result =
                            handle_message(text.as_str(), &state.registry, &state.context).await;
                        if !connection.send(Arc::new(result.response_json)) {
                            warn!(conn_id = %conn_id, "response dropped, closing connection");
                            break;
                        }
                    }
                    Message::Ping(_) | Message::Pong(_) => connection.mark_alive(),
                    Message::Close(_) => {
                        debug!(conn_id = %conn_id, "client sent close frame");
                        break;
                    }
                    Message::Binary(_) => {
                        debug!(conn_id = %conn_id, "ignoring binary frame");
                    }
                }
            }
        }
    }

    cancel.cancel();
    state.broadcast.remove(conn_id.as_str());
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    let _ = writer.await;
    let _ = heartbeat.await;
    info!(
        conn_id = %conn_id,
        dropped = connection.drop_count(),
        age_secs = connection.age().as_secs(),
        "client disconnected"
    );
}
