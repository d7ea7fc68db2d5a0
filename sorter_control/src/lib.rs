//! # Sorter Control
//!
//! Operating-mode brain of a sorter node.
//!
//! ## Modes
//!
//! 1. **Standby**: belts stopped, waiting for an operator start
//! 2. **Running**: sorting; workpieces are registered at the start barrier
//! 3. **ServiceMode**: calibration and self-test sequence
//! 4. **Error**: fault pending operator or subsystem resolution
//! 5. **EStop**: emergency stop, left only after release and reset
//!
//! The machine consumes events from the node's [`EventBus`](sorter_ipc::EventBus)
//! and issues commands through [`MainActions`]. In production the actions are
//! [`BusActions`] over the bridge self-loop, so every command becomes an event
//! that both nodes see.

pub mod actions;
pub mod state;
pub mod workpieces;

pub use actions::{BusActions, MainActions};
pub use state::machine::{Mode, ModeMachine, Outcome, attach, interests, subscriptions};
pub use workpieces::WorkpieceRegistry;
