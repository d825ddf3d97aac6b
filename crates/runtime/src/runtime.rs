//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the simulation.

use std::str::FromStr;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use accord_core::{CoreConfig, Realm, WorldState};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::{Event, EventBus, Topic};
use crate::workers::{ClockWorker, Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub core: CoreConfig,
    /// Wall time per simulation tick. `None` leaves time to explicit
    /// [`RuntimeHandle::advance`] calls.
    pub tick_interval: Option<Duration>,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            tick_interval: None,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

impl RuntimeConfig {
    pub const TICK_MS_VAR: &'static str = "ACCORD_TICK_MS";
    pub const COMMAND_BUFFER_VAR: &'static str = "ACCORD_COMMAND_BUFFER";
    pub const EVENT_BUFFER_VAR: &'static str = "ACCORD_EVENT_BUFFER";
    pub const PROPOSAL_TICKS_VAR: &'static str = "ACCORD_PROPOSAL_TICKS";

    /// Defaults overridden by `ACCORD_*` environment variables.
    ///
    /// `ACCORD_TICK_MS=0` disables the clock.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`RuntimeConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, Self::TICK_MS_VAR)? {
            config.tick_interval = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(size) = parse_var::<usize>(&lookup, Self::COMMAND_BUFFER_VAR)? {
            config.command_buffer_size = positive(Self::COMMAND_BUFFER_VAR, size)?;
        }
        if let Some(size) = parse_var::<usize>(&lookup, Self::EVENT_BUFFER_VAR)? {
            config.event_buffer_size = positive(Self::EVENT_BUFFER_VAR, size)?;
        }
        if let Some(ticks) = parse_var::<u64>(&lookup, Self::PROPOSAL_TICKS_VAR)? {
            config.core = config.core.with_proposal_ticks(ticks);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| RuntimeError::InvalidConfig { key, value: raw })
}

fn positive(key: &'static str, size: usize) -> Result<usize> {
    if size == 0 {
        return Err(RuntimeError::InvalidConfig {
            key,
            value: size.to_string(),
        });
    }
    Ok(size)
}

/// Main runtime that orchestrates the simulation
///
/// Runtime owns the workers; [`RuntimeHandle`] is the cloneable façade for
/// clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
    clock_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Subscribe to events from one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Waits for the simulation worker to drain its queue, which happens once
    /// every outstanding [`RuntimeHandle`] clone has been dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        if let Some(clock_handle) = self.clock_handle {
            clock_handle.await.map_err(RuntimeError::WorkerJoin)?;
        }

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    world: Option<WorldState>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the initial world (empty otherwise)
    pub fn world(mut self, world: WorldState) -> Self {
        self.world = Some(world);
        self
    }

    /// Drive the clock from wall time.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = Some(interval);
        self
    }

    /// Build the runtime and spawn its workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let realm = Realm::with_world(self.world.unwrap_or_default(), self.config.core.clone());

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let clock_handle = self.config.tick_interval.map(|interval| {
            let clock = ClockWorker::new(command_tx.downgrade(), interval);
            tokio::spawn(clock.run())
        });

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let sim_worker = SimulationWorker::new(realm, command_rx, event_bus);
        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        info!(
            tick_interval = ?self.config.tick_interval,
            "runtime started"
        );

        Ok(Runtime {
            handle,
            sim_worker_handle,
            clock_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_vars_keep_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.tick_interval, None);
        assert_eq!(config.command_buffer_size, 32);
        assert_eq!(config.core, CoreConfig::default());
    }

    #[test]
    fn vars_override_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("ACCORD_TICK_MS", "50"),
            ("ACCORD_EVENT_BUFFER", "16"),
            ("ACCORD_PROPOSAL_TICKS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.tick_interval, Some(Duration::from_millis(50)));
        assert_eq!(config.event_buffer_size, 16);
        assert_eq!(config.core.default_proposal_ticks, 30);
    }

    #[test]
    fn zero_tick_disables_clock() {
        let config = RuntimeConfig::from_lookup(lookup(&[("ACCORD_TICK_MS", "0")])).unwrap();
        assert_eq!(config.tick_interval, None);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[("ACCORD_COMMAND_BUFFER", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidConfig { key: "ACCORD_COMMAND_BUFFER", .. }
        ));
        assert!(RuntimeConfig::from_lookup(lookup(&[("ACCORD_EVENT_BUFFER", "0")])).is_err());
    }
}
