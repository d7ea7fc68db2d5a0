//! Sorter IPC
//!
//! Event routing kernel of a sorter node: the in-process [`EventBus`] and
//! the [`IpcBridge`] that connects it to the peer node over a Unix-domain
//! service endpoint.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sorter_common::prelude::*;
//! use sorter_ipc::{BridgeConfig, EventBus, EventHandler, IpcBridge};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), sorter_ipc::IpcError> {
//! let bus = Arc::new(EventBus::new(Role::Master));
//! bus.subscribe(EventKind::StartSShort, |ev| println!("slave start: {ev}"));
//!
//! let mut bridge = IpcBridge::start(BridgeConfig::new("/tmp/sorter"), Arc::clone(&bus))?;
//! bridge.handler().handle_event(Event::new(EventKind::StartMShort));
//! bridge.stop();
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod bus;
pub mod error;
pub mod session;
pub mod wire;

pub use bridge::{BridgeConfig, IpcBridge, SelfLoop};
pub use bus::{Callback, EventBus, EventHandler, Origin, SubscriptionId, Verdict};
pub use error::IpcError;
pub use session::Session;
