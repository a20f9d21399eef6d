//! # stagehandd
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`stagehand.toml` plus environment overrides)
//! - Install the `tracing` subscriber
//! - Open the `SQLite` database and load the saved rules
//! - Initialize the automation engine with the production tool and bot
//!   clients (simulated ones when `[simulator] enabled = true`)
//! - Build the axum router and serve until SIGTERM/SIGINT
//! - Save the rules, with the engine's counters, on the way out
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;

use std::sync::Arc;

use stagehand_adapter_http_axum::router;
use stagehand_adapter_http_axum::state::AppState;
use stagehand_adapter_storage_sqlite_sqlx::Config as DatabaseConfig;
use stagehand_adapter_virtual::{VirtualBot, VirtualProductionTool};
use stagehand_app::activity_log::ActivityLog;
use stagehand_app::automation_engine::AutomationEngine;
use stagehand_app::event_bus::InProcessEventBus;
use stagehand_app::ingest;
use stagehand_app::ports::{BotClient, Disconnected, Notifier, RuleRepository, ToolActionHandler};
use stagehand_app::services::automation_service::AutomationService;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DatabaseConfig::new(config.database_url())
        .with_busy_timeout(config.database_busy_timeout())
        .build()
        .await?;

    // Rules
    let automation_service = Arc::new(AutomationService::new(db.rule_repository()));
    let rules = automation_service.load().await?;

    let activity = Arc::new(ActivityLog::new(config.engine.notification_capacity));

    let served = if config.simulator.enabled {
        let event_bus = Arc::new(InProcessEventBus::new(256));
        let tool = Arc::new(VirtualProductionTool::new(Arc::clone(&event_bus)));
        let bot = Arc::new(VirtualBot::default());

        let engine = Arc::new(AutomationEngine::new(config.engine_options()));
        engine.initialize(rules, Some(bot), Arc::clone(&tool), Arc::clone(&activity));
        tokio::spawn(ingest::pump(event_bus.subscribe(), Arc::clone(&engine), tool));
        tracing::info!("simulated production tool and bot connected");

        serve(&config, AppState::new(automation_service, engine, activity)).await
    } else {
        let engine = Arc::new(AutomationEngine::new(config.engine_options()));
        engine.initialize(
            rules,
            None::<Disconnected>,
            Disconnected,
            Arc::clone(&activity),
        );

        serve(&config, AppState::new(automation_service, engine, activity)).await
    };

    db.close().await;
    served
}

async fn serve<R, T, B, N>(
    config: &Config,
    state: AppState<R, T, B, N>,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let app = router::build(state.clone());

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "stagehandd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state
        .automation_service
        .absorb_counters(&state.engine.rules());
    state.automation_service.persist().await?;
    tracing::info!("rules saved, shutting down");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
