//! # Sorter Node
//!
//! Host library of one conveyor-sorting node (master or slave). The binary
//! in `main.rs` is a thin CLI around [`Node`].
//!
//! ```rust,no_run
//! use sorter::Node;
//! use sorter_common::prelude::*;
//!
//! # fn main() -> Result<(), sorter::NodeError> {
//! let mut node = Node::start(&NodeConfig::with_role(Role::Slave))?;
//! node.inject(Event::new(EventKind::StartSShort));
//! node.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod node;
pub mod watchdog;

pub use node::{Node, NodeError};
pub use watchdog::{Watchdog, WatchdogError};
