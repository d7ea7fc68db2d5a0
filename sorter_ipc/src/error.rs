//! Error types for bus and bridge operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the IPC layer.
///
/// Only [`IpcError::Attach`] and [`IpcError::Spawn`] are fatal; they are
/// returned from [`crate::IpcBridge::start`] and end the process.
#[derive(Error, Debug)]
pub enum IpcError {
    /// Own service endpoint could not be attached
    #[error("Failed to attach service endpoint {path}: {source}")]
    Attach {
        /// Endpoint path
        path: PathBuf,
        /// Source IO error
        source: std::io::Error,
    },

    /// A bridge thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name
        name: &'static str,
        /// Source IO error
        source: std::io::Error,
    },

    /// IO error on the peer link
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Frame could not be encoded or decoded
    #[error("Encoding error: {source}")]
    Encoding {
        /// Source bincode error
        #[from]
        source: bincode::Error,
    },

    /// Malformed traffic
    #[error("Protocol error: {reason}")]
    Protocol {
        /// What was wrong
        reason: String,
    },

    /// Peer answered with an error status
    #[error("Peer rejected message: errno {errno}")]
    Rejected {
        /// errno carried in the reply
        errno: i32,
    },
}

impl IpcError {
    /// Whether the link to the peer is unusable after this error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
