//! Node host: wires the bus, the peer bridge, the mode machine and the
//! watchdog for one role.
//!
//! Startup order matters: the bridge must exist before the mode machine so
//! its actions can target the self-loop, and the watchdog starts last so
//! the first heartbeat already travels over a live dispatch loop.

use parking_lot::Mutex;
use sorter_common::config::{ConfigError, NodeConfig};
use sorter_common::event::{Event, EventKind};
use sorter_common::mode::OperatingMode;
use sorter_common::role::Role;
use sorter_common::settings::{MachineSettings, NodeSettings};
use sorter_common::watchdog::HealthStatus;
use sorter_control::{BusActions, ModeMachine, attach};
use sorter_ipc::{BridgeConfig, EventBus, IpcBridge, IpcError, SelfLoop, SubscriptionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::watchdog::{Watchdog, WatchdogError};

/// Poll period of [`Node::run`].
const RUN_POLL: Duration = Duration::from_millis(100);

type Machine = ModeMachine<BusActions<SelfLoop>>;

/// Node startup failures. Every variant is fatal.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error(transparent)]
    Watchdog(#[from] WatchdogError),
}

pub struct Node {
    settings: NodeSettings,
    bus: Arc<EventBus>,
    bridge: IpcBridge,
    machine: Arc<Mutex<Machine>>,
    subscriptions: Vec<(EventKind, SubscriptionId)>,
    watchdog: Watchdog,
    stopped: bool,
}

impl Node {
    /// Validate `config`, resolve machine settings and start every
    /// component.
    ///
    /// A missing settings file is created with defaults.
    pub fn start(config: &NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let role = config.node.role;

        let machine_settings = MachineSettings::load_or_create(&config.node.settings_file)?;
        let settings = NodeSettings::resolve(role, config.node.pusher_mounted, machine_settings);
        info!(
            "Node {role} (pusher: {}), order {:?}, calibration offset {} reference {}",
            settings.pusher_mounted,
            settings.desired_order,
            settings.calibration.offset,
            settings.calibration.reference
        );

        let bus = Arc::new(EventBus::new(role));
        let bridge = IpcBridge::start(
            BridgeConfig::new(config.node.service_dir.clone()),
            Arc::clone(&bus),
        )?;

        let machine = ModeMachine::new(role, BusActions::new(role, bridge.handler()));
        let (machine, subscriptions) = attach(machine, &bus);
        debug!("Mode machine subscribed to {} kinds", subscriptions.len());

        let mut watchdog = Watchdog::new(
            Arc::clone(&bus),
            Arc::new(bridge.handler()),
            config.watchdog,
        )?;
        watchdog.start()?;

        info!("Node {role} started");
        Ok(Self {
            settings,
            bus,
            bridge,
            machine,
            subscriptions,
            watchdog,
            stopped: false,
        })
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.settings.role
    }

    /// Settings resolved at startup; the calibration values feed the height
    /// sensor.
    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Injection point for sensor drivers and other local producers.
    pub fn handler(&self) -> SelfLoop {
        self.bridge.handler()
    }

    pub fn inject(&self, event: Event) {
        self.bridge.send_to_self(event);
    }

    pub fn mode(&self) -> OperatingMode {
        self.machine.lock().kind()
    }

    pub fn is_connected(&self) -> bool {
        self.bridge.is_connected()
    }

    pub fn peer_health(&self) -> HealthStatus {
        self.watchdog.health()
    }

    /// Block until `running` is cleared.
    pub fn run(&self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(RUN_POLL);
        }
    }

    /// Stop the watchdog, then the bridge. Idempotent.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.watchdog.stop();
        for (kind, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(kind, id);
        }
        self.bridge.stop();
        info!("Node {} shut down", self.settings.role);
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shutdown();
    }
}
