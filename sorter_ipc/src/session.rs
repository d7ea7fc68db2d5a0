//! Connection session with the peer node.
//!
//! Holds the outbound stream to the peer's service endpoint and the
//! `peer_connected` flag that gates forwarding. The session starts
//! disconnected and becomes connected only after the `Connect` rendezvous
//! is acknowledged by the peer.

use parking_lot::Mutex;
use sorter_common::event::Event;
use sorter_common::role::Role;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::IpcError;
use crate::wire::{self, MSG_CONNECT, PULSE_CODE_DISCONNECT};

pub struct Session {
    role: Role,
    local_path: PathBuf,
    peer_path: PathBuf,
    io_timeout: Duration,
    peer_connected: AtomicBool,
    outbound: Mutex<Option<UnixStream>>,
}

impl Session {
    pub fn new(role: Role, service_dir: &Path, io_timeout: Duration) -> Self {
        Self {
            role,
            local_path: service_dir.join(role.local_service()),
            peer_path: service_dir.join(role.peer_service()),
            io_timeout,
            peer_connected: AtomicBool::new(false),
            outbound: Mutex::new(None),
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Own service endpoint.
    #[inline]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Peer service endpoint.
    #[inline]
    pub fn peer_path(&self) -> &Path {
        &self.peer_path
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.peer_connected.load(Ordering::SeqCst)
    }

    /// Set the forwarding flag. Returns the previous value.
    pub fn set_connected(&self, connected: bool) -> bool {
        self.peer_connected.swap(connected, Ordering::SeqCst)
    }

    /// Whether an outbound stream exists.
    pub fn has_link(&self) -> bool {
        self.outbound.lock().is_some()
    }

    /// Rendezvous with the peer endpoint.
    ///
    /// Connects, sends `Connect` and waits for a success reply. On success
    /// the stream is kept and the session is marked connected.
    pub fn connect(&self) -> Result<(), IpcError> {
        let mut stream = UnixStream::connect(&self.peer_path)?;
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;

        wire::write_message(&mut stream, MSG_CONNECT)?;
        let (status, _) = wire::read_reply(&mut stream)?;
        if status != 0 {
            return Err(IpcError::Rejected { errno: status });
        }

        *self.outbound.lock() = Some(stream);
        self.set_connected(true);
        info!("Connected to {}", self.peer_path.display());
        Ok(())
    }

    /// Send `event` to the peer. At most once, no retry.
    ///
    /// Returns `Ok(false)` while disconnected. A transport failure drops the
    /// outbound stream and clears the connected flag.
    pub fn forward(&self, event: Event) -> Result<bool, IpcError> {
        if !self.is_connected() {
            debug!("Not forwarding {event}: peer disconnected");
            return Ok(false);
        }
        let mut outbound = self.outbound.lock();
        let Some(stream) = outbound.as_mut() else {
            return Ok(false);
        };

        let result = wire::write_event(stream, event).and_then(|()| wire::read_reply(stream));
        match result {
            Ok((0, _)) => {
                debug!("Forwarded {event}");
                Ok(true)
            }
            Ok((errno, _)) => Err(IpcError::Rejected { errno }),
            Err(e) => {
                if e.is_transport() {
                    if let Some(stream) = outbound.take() {
                        let _ = stream.shutdown(Shutdown::Both);
                    }
                    self.set_connected(false);
                }
                Err(e)
            }
        }
    }

    /// Drop the outbound stream and clear the connected flag.
    ///
    /// Returns `true` if the session was up in either sense.
    pub fn disconnect(&self) -> bool {
        let had_link = match self.outbound.lock().take() {
            Some(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
                true
            }
            None => false,
        };
        let was_connected = self.set_connected(false);
        had_link || was_connected
    }

    /// Tell the peer this node is going away, then disconnect.
    pub fn close(&self) {
        if let Some(stream) = self.outbound.lock().as_mut() {
            if let Err(e) = wire::write_pulse(stream, PULSE_CODE_DISCONNECT, 0) {
                warn!("Failed to send disconnect pulse: {e}");
            }
        }
        self.disconnect();
    }
}
