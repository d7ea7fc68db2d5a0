//! Sorter Common Library
//!
//! Shared event model, node roles, operating modes and configuration
//! loading for every crate in the sorter workspace.
//!
//! # Module Structure
//!
//! - [`event`] - Event kinds, payloads and structured input decoding
//! - [`role`] - Master/slave role and belt side
//! - [`mode`] - Externally visible operating modes
//! - [`config`] - TOML node configuration
//! - [`settings`] - `KEY=VALUE` machine settings file
//! - [`watchdog`] - Heartbeat health classification
//! - [`workpiece`] - Workpiece records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sorter_common::prelude::*;
//!
//! let ev = Event::new(EventKind::StartMShort);
//! assert_eq!(ev.kind.input().map(|i| i.side), Some(Side::Master));
//! ```

pub mod config;
pub mod consts;
pub mod event;
pub mod mode;
pub mod prelude;
pub mod role;
pub mod settings;
pub mod watchdog;
pub mod workpiece;
