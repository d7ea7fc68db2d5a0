//! State machine module root.
//!
//! The mode machine lives in [`machine`]; the per-mode contexts it carries
//! live next to it.

pub mod error;
pub mod estop;
pub mod machine;
pub mod service;
