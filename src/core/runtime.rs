//! Runtime orchestration: wires the subscription manager, the two HTTP
//! listeners, and the bus source, and fans shutdown out to all of them.

use crate::core::config::Config;
use crate::pipeline::publish::Processor;
use crate::pipeline::source::run_bus_source;
use crate::submgr::SubscriptionManager;
use crate::web::{api, events};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() -> &'static str {
    let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

/// The assembled gateway process.
pub struct Runtime {
    config: Config,
    manager: Arc<SubscriptionManager>,
    shutdown_tx: watch::Sender<bool>,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let manager = SubscriptionManager::new(config.sse.limits()?);
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            manager,
            shutdown_tx,
        })
    }

    pub fn manager(&self) -> Arc<SubscriptionManager> {
        Arc::clone(&self.manager)
    }

    /// Run until SIGINT/SIGTERM, then tear down: stop the listeners and
    /// the bus source, then close the registry (which stops the sweeper
    /// and deletes every subscription).
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            manager,
            shutdown_tx,
        } = self;
        manager.start_sweeper();

        // Management listener, with a per-request timeout.
        let api_bind = format!("{}:{}", config.sse.api_addr, config.sse.api_port);
        let api_listener = TcpListener::bind(&api_bind)
            .await
            .with_context(|| format!("failed to bind management listener on {api_bind}"))?;
        let api_router = api::management_router(Arc::clone(&manager))
            .layer(TimeoutLayer::new(config.sse.request_timeout()?));
        let mut api_shutdown = shutdown_tx.subscribe();
        let api_task = tokio::spawn(async move {
            axum::serve(api_listener, api_router)
                .with_graceful_shutdown(async move {
                    let _ = api_shutdown.changed().await;
                })
                .await
        });
        tracing::info!(addr = %api_bind, "management listener ready");

        // Streaming listener. No timeout layer here: SSE responses live
        // until the client goes away.
        let events_bind = format!("{}:{}", config.sse.events_addr, config.sse.events_port);
        let events_listener = TcpListener::bind(&events_bind)
            .await
            .with_context(|| format!("failed to bind events listener on {events_bind}"))?;
        let events_router = events::events_router(Arc::clone(&manager));
        let mut events_shutdown = shutdown_tx.subscribe();
        let events_task = tokio::spawn(async move {
            axum::serve(events_listener, events_router)
                .with_graceful_shutdown(async move {
                    let _ = events_shutdown.changed().await;
                })
                .await
        });
        tracing::info!(addr = %events_bind, "events listener ready");

        let bus_task = if config.bus.enabled {
            let processor = Arc::new(Processor::new(Arc::clone(&manager)));
            let bus_config = config.bus.clone();
            let bus_shutdown = shutdown_tx.subscribe();
            Some(tokio::spawn(async move {
                if let Err(err) = run_bus_source(bus_config, processor, bus_shutdown).await {
                    tracing::error!(error = %err, "bus source stopped");
                }
            }))
        } else {
            tracing::info!("bus source disabled by configuration");
            None
        };

        let sig = shutdown_signal().await;
        tracing::info!(signal = sig, "shutting down");
        let _ = shutdown_tx.send(true);
        let _ = api_task.await;
        let _ = events_task.await;
        if let Some(task) = bus_task {
            let _ = task.await;
        }
        manager.close();
        Ok(())
    }
}
