//! # Peer Heartbeat Watchdog
//!
//! Two timer threads per node:
//!
//! - **sender**: emits this node's heartbeat every `send_interval` through
//!   the node's [`EventHandler`] (the bridge self-loop forwards it to the
//!   peer).
//! - **checker**: every `check_interval`, classifies the age of the last
//!   peer heartbeat. A stale peer is logged at error level; no mode change
//!   is forced.
//!
//! The peer heartbeat reaches [`Watchdog::heartbeat_received`] through a bus
//! subscription made at construction.

use parking_lot::{Condvar, Mutex};
use sorter_common::config::{ConfigError, WatchdogConfig};
use sorter_common::event::{Event, EventKind};
use sorter_common::role::Role;
use sorter_common::watchdog::HealthStatus;
use sorter_ipc::{EventBus, EventHandler, SubscriptionId};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Error type for watchdog operations.
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    /// Timing configuration rejected.
    #[error("invalid watchdog configuration: {0}")]
    Config(#[from] ConfigError),

    /// A timer thread could not be started.
    #[error("failed to spawn watchdog {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// ─── Shared state ───────────────────────────────────────────────────

struct Shared {
    last_heartbeat: Mutex<Instant>,
    running: Mutex<bool>,
    wake: Condvar,
    timeout: Duration,
}

impl Shared {
    fn touch(&self) {
        *self.last_heartbeat.lock() = Instant::now();
    }

    fn heartbeat_age(&self) -> Duration {
        self.last_heartbeat.lock().elapsed()
    }

    fn health(&self) -> HealthStatus {
        HealthStatus::classify(self.heartbeat_age(), self.timeout)
    }

    /// Sleep for `period` or until stopped. Returns whether still running.
    fn pause(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        let mut running = self.running.lock();
        while *running {
            if self.wake.wait_until(&mut running, deadline).timed_out() {
                break;
            }
        }
        *running
    }
}

// ─── Watchdog ───────────────────────────────────────────────────────

pub struct Watchdog {
    role: Role,
    config: WatchdogConfig,
    bus: Arc<EventBus>,
    handler: Arc<dyn EventHandler>,
    subscription: SubscriptionId,
    shared: Arc<Shared>,
    threads: Vec<(&'static str, JoinHandle<()>)>,
}

impl Watchdog {
    /// Create a stopped watchdog and subscribe to the peer's heartbeat.
    ///
    /// The last-heartbeat time starts at "now", so a freshly started node
    /// is healthy for one timeout.
    pub fn new(
        bus: Arc<EventBus>,
        handler: Arc<dyn EventHandler>,
        config: WatchdogConfig,
    ) -> Result<Self, WatchdogError> {
        config.validate()?;
        let role = bus.role();
        let shared = Arc::new(Shared {
            last_heartbeat: Mutex::new(Instant::now()),
            running: Mutex::new(false),
            wake: Condvar::new(),
            timeout: config.timeout(),
        });

        let on_heartbeat = Arc::clone(&shared);
        let subscription = bus.subscribe(role.peer_heartbeat(), move |_| on_heartbeat.touch());

        Ok(Self {
            role,
            config,
            bus,
            handler,
            subscription,
            shared,
            threads: Vec::new(),
        })
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_running(&self) -> bool {
        !self.threads.is_empty()
    }

    /// Start the sender and checker threads. Restarts a running watchdog.
    pub fn start(&mut self) -> Result<(), WatchdogError> {
        if self.is_running() {
            debug!("Watchdog already running, restarting");
            self.stop();
        }
        *self.shared.running.lock() = true;

        let sender = {
            let shared = Arc::clone(&self.shared);
            let handler = Arc::clone(&self.handler);
            let kind = self.role.own_heartbeat();
            let interval = self.config.send_interval();
            self.spawn("sender", move || run_sender(&shared, handler.as_ref(), kind, interval))
        };
        if let Err(e) = sender {
            *self.shared.running.lock() = false;
            return Err(e);
        }

        let checker = {
            let shared = Arc::clone(&self.shared);
            let interval = self.config.check_interval();
            self.spawn("checker", move || run_checker(&shared, interval))
        };
        if let Err(e) = checker {
            self.stop();
            return Err(e);
        }

        info!(
            "Watchdog started (send {:?}, check {:?}, timeout {:?})",
            self.config.send_interval(),
            self.config.check_interval(),
            self.config.timeout()
        );
        Ok(())
    }

    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<(), WatchdogError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("wd-{name}"))
            .spawn(body)
            .map_err(|source| WatchdogError::Spawn { name, source })?;
        self.threads.push((name, handle));
        Ok(())
    }

    /// Wake and join both threads. Idempotent.
    pub fn stop(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        {
            let mut running = self.shared.running.lock();
            *running = false;
            self.shared.wake.notify_all();
        }
        for (name, handle) in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("Watchdog {name} thread panicked");
            }
        }
        info!("Watchdog stopped");
    }

    /// Record a peer heartbeat at "now".
    pub fn heartbeat_received(&self) {
        self.shared.touch();
    }

    /// Time since the last peer heartbeat.
    pub fn heartbeat_age(&self) -> Duration {
        self.shared.heartbeat_age()
    }

    pub fn health(&self) -> HealthStatus {
        self.shared.health()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
        self.bus.unsubscribe(self.role.peer_heartbeat(), self.subscription);
    }
}

// ─── Threads ────────────────────────────────────────────────────────

fn run_sender(shared: &Shared, handler: &dyn EventHandler, kind: EventKind, interval: Duration) {
    loop {
        handler.handle_event(Event::new(kind));
        if !shared.pause(interval) {
            break;
        }
    }
}

fn run_checker(shared: &Shared, interval: Duration) {
    let mut was_stale = false;
    while shared.pause(interval) {
        match shared.health() {
            HealthStatus::Stale { age } => {
                error!("Peer heartbeat stale: last seen {age:?} ago");
                was_stale = true;
            }
            HealthStatus::Healthy if was_stale => {
                info!("Peer heartbeat recovered");
                was_stale = false;
            }
            HealthStatus::Healthy => {}
        }
    }
}
