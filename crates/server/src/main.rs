use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapcart_core::{
    config_path, create_event_channel, load_config, validate_config, Coordinator, LogObserver, Platform,
    PlatformBackend, Session, SettingsStore, SimulatedPlatform, TomlSettingsStore,
};
use snapcart_server::api::{create_router, RecentEvents, WsBroadcaster};
use snapcart_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Interval between websocket heartbeats
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = config_path();

    info!("snapcart {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);
    info!("Settings path: {:?}", config.settings.path);

    let platform: Arc<dyn Platform> = match config.platform.backend {
        PlatformBackend::Simulated => {
            info!("Using simulated platform");
            Arc::new(SimulatedPlatform::new(config.platform.simulated.clone()))
        }
    };

    let session = Arc::new(Session::restore(platform).await);

    let settings_store: Arc<dyn SettingsStore> =
        Arc::new(TomlSettingsStore::new(&config.settings.path));
    match settings_store.load() {
        Ok(settings) => session.set_payment_password(settings.payment_password),
        Err(e) => warn!("Failed to load settings: {}", e),
    }

    // Status events fan out to the log, the in-memory history and websocket clients
    let ws_broadcaster = WsBroadcaster::default();
    let recent_events = Arc::new(RecentEvents::default());
    let (events, dispatcher) = create_event_channel();
    let dispatcher = dispatcher
        .with_observer(Arc::new(LogObserver))
        .with_observer(recent_events.clone())
        .with_observer(Arc::new(ws_broadcaster.clone()));
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    let shutdown = CancellationToken::new();

    let heartbeat_broadcaster = ws_broadcaster.clone();
    let heartbeat_shutdown = shutdown.clone();
    let heartbeat_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        loop {
            tokio::select! {
                _ = heartbeat_shutdown.cancelled() => break,
                _ = interval.tick() => heartbeat_broadcaster.heartbeat(),
            }
        }
    });

    let coordinator = Arc::new(Coordinator::new(
        session,
        settings_store,
        events,
        config.polling.clone(),
    ));

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&coordinator),
        recent_events,
        ws_broadcaster,
        shutdown.clone(),
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Websocket tasks watch the token, so they close as soon as the signal arrives
    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            serve_shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    shutdown.cancel();
    coordinator.shutdown().await;
    let _ = heartbeat_handle.await;

    // The coordinator owns the last event handle; dropping it lets the
    // dispatcher drain and exit.
    drop(coordinator);
    let _ = dispatcher_handle.await;
    info!("Event dispatcher stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
