//! Rainbow Dial - A drag-to-set visual countdown dial served over HTTP
//! 
//! This is the main entry point for the rainbow-dial application.

use std::sync::Arc;
use rand::{rngs::StdRng, SeedableRng};
use tokio::net::TcpListener;
use tracing::{info, warn};

use rainbow_dial::{
    config::Config,
    dial::{DialEngine, EngineServices},
    state::{app_state::now_ms, AppState},
    api::create_router,
    services::{
        check_notify_send_available, AudioOutput, DesktopAlerts, DesktopPrompt, JsonFileStore,
        KeyValueStore, MemoryStore, NoInhibitor, NotificationHints, NotificationScheduler,
        PermissionPrompt, PersistenceGateway, SleepInhibitor, SystemdInhibitor,
    },
    tasks::{frame_loop_task, notification_worker_task},
    utils::shutdown_signal,
};

#[cfg(feature = "playback")]
fn audio_output() -> Box<dyn AudioOutput> {
    Box::new(rainbow_dial::services::playback::RodioOutput::new())
}

#[cfg(not(feature = "playback"))]
fn audio_output() -> Box<dyn AudioOutput> {
    Box::new(rainbow_dial::services::SilentOutput)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("rainbow_dial={},tower_http=info", config.log_level()))
        .init();

    info!("Starting rainbow-dial server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, store={}, grow={}ms",
          config.host, config.port,
          if config.ephemeral { "memory".to_string() } else { config.store.display().to_string() },
          config.grow_ms);

    let store: Box<dyn KeyValueStore> = if config.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(config.store.clone()))
    };

    // Desktop notifications need notify-send; without it the dial still works
    let notifications_available = if config.no_notifications {
        info!("Desktop notifications disabled by flag");
        false
    } else if let Err(e) = check_notify_send_available().await {
        warn!("{}", e);
        false
    } else {
        true
    };

    type Notifications = (NotificationScheduler, Box<dyn PermissionPrompt>);
    let (notifier, permission): Notifications = if notifications_available {
        let (notifier, rx) = NotificationScheduler::channel();
        tokio::spawn(async move {
            notification_worker_task(rx, DesktopAlerts::new()).await;
        });
        (notifier, Box::new(DesktopPrompt::new()))
    } else {
        (NotificationScheduler::disabled(), Box::new(DesktopPrompt::denied()))
    };

    let inhibitor: Box<dyn SleepInhibitor> = if config.no_keep_awake {
        info!("Keep-awake disabled by flag");
        Box::new(NoInhibitor)
    } else {
        Box::new(SystemdInhibitor::new())
    };

    let services = EngineServices {
        persistence: PersistenceGateway::new(store),
        audio: audio_output(),
        notifier,
        permission,
        hints: NotificationHints::new(config.lang()),
        inhibitor,
    };

    let mut engine = DialEngine::new(config.dial_config(), services, StdRng::from_entropy());
    if engine.restore(now_ms()) {
        info!("Restored running timer from {}", config.store.display());
    }

    // Create application state
    let state = Arc::new(AppState::new(engine, config.port, config.host.clone()));

    // Start the frame loop background task
    let frame_state = Arc::clone(&state);
    tokio::spawn(async move {
        frame_loop_task(frame_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /pointer/down      - Press on dial, control, title or page");
    info!("  POST /pointer/move      - Drag the dial hand");
    info!("  POST /pointer/up        - Release (tap or drag end)");
    info!("  POST /quick-set/:value  - Jump to 5..60 and start");
    info!("  POST /unit/:unit        - Switch between min and sec");
    info!("  POST /mute              - Toggle sound and notifications");
    info!("  POST /viewport          - Report a resize");
    info!("  GET  /status            - Current dial snapshot");
    info!("  GET  /particles         - Live confetti pieces");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
