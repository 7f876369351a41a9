//! Daemon orchestration -- engine assembly, event logging, and lifecycle management.
//!
//! The [`Orchestrator`] loads configuration, builds the filter engine,
//! starts it together with the discard event logger, and tears both down
//! in order when a shutdown signal arrives.
//!
//! # Shutdown Order
//!
//! 1. Discard event logger (stop consuming)
//! 2. Filter engine (cancel background tasks, detach XDP)

use std::future::Future;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use flowgate_core::config::FlowgateConfig;
use flowgate_core::event::DiscardEvent;
use flowgate_core::pipeline::{HealthStatus, Pipeline};
use flowgate_filter_engine::{EngineConfig, FilterEngine};

use crate::health::{ComponentHealth, DaemonHealth, aggregate_status};
use crate::metrics_server;

/// Component name used in health reports.
const FILTER_COMPONENT: &str = "filter-engine";

/// Capacity of the discard event channel between the engine and the logger.
const DISCARD_CHANNEL_CAPACITY: usize = 1024;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: FlowgateConfig,
    /// Filter engine (None when `[filter] enabled = false`).
    engine: Option<FilterEngine>,
    /// Discard events produced by the engine, handed to the logger on run.
    events: Option<mpsc::Receiver<DiscardEvent>>,
    /// Cancels the event logger.
    cancel: CancellationToken,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from disk and build the orchestrator.
    ///
    /// # Errors
    ///
    /// - Configuration file cannot be read, parsed, or validated
    /// - The filter engine fails to initialize
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = FlowgateConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Installs the metrics recorder when `[metrics] enabled = true`.
    pub fn build_from_config(config: FlowgateConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let (engine, events) = if config.filter.enabled {
            tracing::info!(interface = config.filter.interface.as_str(), "initializing filter engine");
            let engine_config = EngineConfig::from_core(&config.filter)
                .map_err(|e| anyhow::anyhow!("invalid filter config: {}", e))?;
            let (event_tx, event_rx) = mpsc::channel::<DiscardEvent>(DISCARD_CHANNEL_CAPACITY);
            let (engine, _closed_rx) = FilterEngine::builder()
                .config(engine_config)
                .event_sender(event_tx)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build filter engine: {}", e))?;
            (Some(engine), Some(event_rx))
        } else {
            tracing::warn!("filter engine disabled in configuration; no packets will be filtered");
            (None, None)
        };

        Ok(Self {
            config,
            engine,
            events,
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    /// Start the engine and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start the engine and block until `shutdown` resolves.
    ///
    /// `shutdown` yields the name of the trigger for logging.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        if let Some(engine) = self.engine.as_mut() {
            engine
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start filter engine: {}", e))?;
            tracing::info!(
                interface = engine.attached_interface().unwrap_or("-"),
                "filter engine started"
            );
        }

        let logger = self
            .events
            .take()
            .map(|rx| spawn_event_logger(rx, self.cancel.child_token()));

        tracing::info!("flowgate-daemon running");
        let signal = shutdown.await;
        match &signal {
            Ok(name) => tracing::info!(signal = *name, "shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "shutdown signal handler failed"),
        }

        self.cancel.cancel();
        if let Some(task) = logger {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "event logger ended abnormally");
            }
        }

        self.shutdown().await?;
        signal.map(|_| ())
    }

    /// Stop the filter engine if it is running.
    async fn shutdown(&mut self) -> Result<()> {
        if let Some(engine) = self.engine.as_mut() {
            if engine.is_running() {
                tracing::info!("stopping filter engine");
                engine
                    .stop()
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to stop filter engine: {}", e))?;
            }
        }
        tracing::info!("flowgate-daemon shut down");
        Ok(())
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let status = match &self.engine {
            Some(engine) => engine.health_check().await,
            None => HealthStatus::Healthy,
        };
        let components = vec![ComponentHealth {
            name: FILTER_COMPONENT.to_owned(),
            enabled: self.engine.is_some(),
            status,
        }];

        DaemonHealth {
            status: aggregate_status(&components),
            uptime_secs: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &FlowgateConfig {
        &self.config
    }

    /// Get a reference to the filter engine, if enabled.
    pub fn engine(&self) -> Option<&FilterEngine> {
        self.engine.as_ref()
    }
}

/// Log every discard event until cancelled or the engine drops its sender.
///
/// Events the engine could not enqueue are already counted in
/// `flowgate_filter_events_dropped_total`.
fn spawn_event_logger(
    mut rx: mpsc::Receiver<DiscardEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut logged: u64 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => {
                        logged += 1;
                        tracing::info!(
                            event_id = event.id.as_str(),
                            src_addr = %event.src_addr,
                            stage = %event.stage,
                            "packet discarded"
                        );
                    }
                    None => {
                        tracing::debug!("discard event channel closed");
                        break;
                    }
                },
            }
        }
        tracing::info!(events = logged, "discard event logger stopped");
    })
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use flowgate_core::event::DiscardStage;

    use super::*;

    #[tokio::test]
    async fn event_logger_stops_on_cancel() {
        let (tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = spawn_event_logger(rx, cancel.clone());

        tx.send(DiscardEvent::new(Ipv4Addr::new(10, 0, 0, 1), DiscardStage::RateLimiter))
            .await
            .unwrap();
        cancel.cancel();
        task.await.unwrap();
    }

    #[test]
    fn engine_events_flow_into_logger_channel() {
        let mut config = FlowgateConfig::default();
        config.metrics.enabled = false;
        config.filter.program_path = "/nonexistent/flowgate-ebpf".to_owned();
        let mut orchestrator = Orchestrator::build_from_config(config).unwrap();

        // The engine holds the sender, so the channel stays open.
        let rx = orchestrator.events.as_mut().unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn event_logger_stops_when_sender_dropped() {
        let (tx, rx) = mpsc::channel::<DiscardEvent>(4);
        let task = spawn_event_logger(rx, CancellationToken::new());
        drop(tx);
        task.await.unwrap();
    }
}
