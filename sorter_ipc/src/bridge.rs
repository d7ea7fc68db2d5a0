//! IPC Bridge.
//!
//! Owns the internal self-loop channel and the peer session. Three threads:
//!
//! - **dispatch**: owns the self-loop receiver, runs every bus subscriber,
//!   forwards locally originated events to the peer afterwards;
//! - **receive**: accepts the peer's connection on the own service endpoint,
//!   answers its messages and enqueues decoded events tagged as peer traffic;
//! - **link**: rendezvous with the peer endpoint, retrying without ceiling.
//!
//! Peer traffic never calls subscribers directly; it always goes through
//! the self-loop.

use parking_lot::{Condvar, Mutex};
use sorter_common::consts::{CONNECT_RETRY_MS, PEER_IO_TIMEOUT_MS};
use sorter_common::event::{Event, EventKind};
use sorter_common::role::Role;
use std::fs;
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::bus::{EventBus, EventHandler, Origin, Verdict};
use crate::error::IpcError;
use crate::session::Session;
use crate::wire::{
    self, Frame, MSG_CONNECT, PULSE_CODE_DISCONNECT, PULSE_CODE_LIVENESS, PULSE_CODE_UNBLOCK,
    REPLY_OK,
};

// ─── Configuration ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory holding both service endpoints.
    pub service_dir: PathBuf,
    /// Pause between rendezvous attempts.
    pub retry_interval: Duration,
    /// Bound for one send/reply exchange.
    pub io_timeout: Duration,
}

impl BridgeConfig {
    pub fn new(service_dir: impl Into<PathBuf>) -> Self {
        Self {
            service_dir: service_dir.into(),
            retry_interval: Duration::from_millis(CONNECT_RETRY_MS),
            io_timeout: Duration::from_millis(PEER_IO_TIMEOUT_MS),
        }
    }
}

// ─── Self-loop ──────────────────────────────────────────────────────

enum Envelope {
    Event(Event, Origin),
    Stop,
}

/// Sending half of the internal self-loop. Cheap to clone, usable from any
/// thread.
#[derive(Clone)]
pub struct SelfLoop {
    tx: Sender<Envelope>,
}

impl SelfLoop {
    /// Enqueue `event`. Returns `false` once the dispatch loop has ended.
    pub fn send(&self, event: Event, origin: Origin) -> bool {
        let sent = self.tx.send(Envelope::Event(event, origin)).is_ok();
        if !sent {
            debug!("Self-loop closed, dropped {event}");
        }
        sent
    }

    fn stop(&self) {
        let _ = self.tx.send(Envelope::Stop);
    }
}

impl EventHandler for SelfLoop {
    fn handle_event(&self, event: Event) {
        self.send(event, Origin::Local);
    }
}

// ─── Bridge ─────────────────────────────────────────────────────────

struct Shared {
    bus: Arc<EventBus>,
    session: Session,
    self_loop: SelfLoop,
    running: AtomicBool,
    /// Clone of the peer connection being served, for shutdown on stop.
    active: Mutex<Option<UnixStream>>,
    link_lock: Mutex<()>,
    link_wake: Condvar,
    retry_interval: Duration,
    io_timeout: Duration,
}

impl Shared {
    #[inline]
    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct IpcBridge {
    shared: Arc<Shared>,
    threads: Vec<(&'static str, JoinHandle<()>)>,
}

impl IpcBridge {
    /// Attach the own service endpoint and start all bridge threads.
    ///
    /// # Errors
    ///
    /// [`IpcError::Attach`] if the endpoint cannot be bound,
    /// [`IpcError::Spawn`] if a thread cannot be started. Both are fatal
    /// for the node.
    pub fn start(config: BridgeConfig, bus: Arc<EventBus>) -> Result<Self, IpcError> {
        let role = bus.role();
        let (tx, rx) = mpsc::channel();
        let session = Session::new(role, &config.service_dir, config.io_timeout);
        let listener = attach(session.local_path())?;

        let shared = Arc::new(Shared {
            bus,
            session,
            self_loop: SelfLoop { tx },
            running: AtomicBool::new(true),
            active: Mutex::new(None),
            link_lock: Mutex::new(()),
            link_wake: Condvar::new(),
            retry_interval: config.retry_interval,
            io_timeout: config.io_timeout,
        });

        let mut bridge = Self {
            shared,
            threads: Vec::with_capacity(3),
        };
        bridge.spawn("ipc-dispatch", move |shared| run_dispatch(&shared, rx))?;
        bridge.spawn("ipc-receive", move |shared| run_receive(&shared, listener))?;
        bridge.spawn("ipc-link", |shared| run_link(&shared))?;

        info!(
            "IPC bridge started as {} on {}",
            role,
            bridge.shared.session.local_path().display()
        );
        Ok(bridge)
    }

    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<(), IpcError>
    where
        F: FnOnce(Arc<Shared>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(shared))
            .map_err(|source| IpcError::Spawn { name, source })?;
        self.threads.push((name, handle));
        Ok(())
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.shared.session.role()
    }

    /// Handle for injecting events into the self-loop.
    pub fn handler(&self) -> SelfLoop {
        self.shared.self_loop.clone()
    }

    /// Enqueue a locally originated event.
    pub fn send_to_self(&self, event: Event) {
        self.shared.self_loop.handle_event(event);
    }

    /// Send `event` to the peer directly, bypassing local dispatch.
    ///
    /// No-op (`Ok(false)`) while disconnected.
    pub fn forward_to_peer(&self, event: Event) -> Result<bool, IpcError> {
        self.shared.session.forward(event)
    }

    /// Whether locally originated events are currently forwarded.
    pub fn is_connected(&self) -> bool {
        self.shared.session.is_connected()
    }

    /// Own service endpoint.
    pub fn local_path(&self) -> &Path {
        self.shared.session.local_path()
    }

    /// Stop all threads and detach the endpoint. Idempotent.
    pub fn stop(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        info!("Stopping IPC bridge");
        let shared = &self.shared;
        shared.running.store(false, Ordering::SeqCst);
        shared.session.close();

        {
            let _guard = shared.link_lock.lock();
            shared.link_wake.notify_all();
        }
        if let Some(stream) = shared.active.lock().as_ref() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        // Wake a blocking accept().
        let _ = UnixStream::connect(shared.session.local_path());
        shared.self_loop.stop();

        for (name, handle) in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("{name} thread panicked");
            }
        }
        shared.session.disconnect();
        if let Err(e) = fs::remove_file(shared.session.local_path()) {
            debug!("Endpoint already removed: {e}");
        }
        info!("IPC bridge stopped");
    }
}

impl Drop for IpcBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn attach(path: &Path) -> Result<UnixListener, IpcError> {
    let attach_err = |source| IpcError::Attach {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(attach_err)?;
    }
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed stale endpoint {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(attach_err(e)),
    }
    UnixListener::bind(path).map_err(attach_err)
}

// ─── Dispatch loop ──────────────────────────────────────────────────

fn run_dispatch(shared: &Shared, rx: Receiver<Envelope>) {
    debug!("Dispatch loop started");
    while let Ok(envelope) = rx.recv() {
        let (event, origin) = match envelope {
            Envelope::Event(event, origin) => (event, origin),
            Envelope::Stop => break,
        };

        if event.kind.is_node_local() && origin == Origin::Peer {
            warn!("Ignoring {event} received from peer");
            continue;
        }
        match event.kind {
            EventKind::StopThread => break,
            EventKind::ConnectionLost => {
                shared.session.set_connected(false);
            }
            EventKind::ConnectionReestablished => {
                shared.session.set_connected(true);
            }
            _ => {}
        }

        let verdict = shared.bus.dispatch_inbound(event, origin);
        if origin == Origin::Local && verdict != Verdict::Rebound && !event.kind.is_node_local() {
            if let Err(e) = shared.session.forward(event) {
                warn!("Forwarding {event} failed: {e}");
            }
        }
    }
    debug!("Dispatch loop finished");
}

// ─── Receive loop ───────────────────────────────────────────────────

/// What the receive loop does with one inbound message.
#[derive(Debug, PartialEq, Eq)]
struct Reaction {
    /// `(status, payload)` to send back.
    reply: Option<(i32, &'static [u8])>,
    /// Events to enqueue, tagged as peer traffic.
    events: Vec<Event>,
    /// Peer announced it is going away.
    disconnect: bool,
}

impl Reaction {
    fn reply(status: i32, payload: &'static [u8]) -> Self {
        Self {
            reply: Some((status, payload)),
            events: Vec::new(),
            disconnect: false,
        }
    }
}

fn react(frame: Frame, role: Role) -> Reaction {
    match frame {
        Frame::Pulse { code, value } => {
            let mut events = vec![Event::new(role.peer_heartbeat())];
            let mut disconnect = false;
            match code {
                PULSE_CODE_DISCONNECT => disconnect = true,
                PULSE_CODE_UNBLOCK | PULSE_CODE_LIVENESS => {}
                code => match EventKind::from_code(i32::from(code)) {
                    Some(kind) if kind.is_node_local() => {
                        warn!("Dropped pulse carrying node-local {kind}");
                    }
                    Some(kind) => events.push(Event::with_data(kind, value)),
                    None => warn!("Unknown pulse code {code}"),
                },
            }
            Reaction {
                reply: None,
                events,
                disconnect,
            }
        }
        Frame::Control {
            msg_type: MSG_CONNECT,
        } => Reaction::reply(0, &[]),
        Frame::Control { msg_type } => {
            warn!("Unsupported control message {msg_type:#06x}");
            Reaction::reply(libc::ENOSYS, &[])
        }
        Frame::EventNotification(body) => match wire::body_to_event(body) {
            Some(event) if event.kind.is_node_local() => {
                warn!("Rejected node-local {event} from peer");
                Reaction::reply(libc::EINVAL, &[])
            }
            Some(event) => Reaction {
                events: vec![event],
                ..Reaction::reply(0, REPLY_OK)
            },
            None => {
                warn!("Event notification with unknown kind {}", body.event_kind);
                Reaction::reply(libc::EINVAL, &[])
            }
        },
        Frame::DataBlob { len } => {
            warn!("Rejected data blob of {len} bytes");
            Reaction::reply(libc::EPERM, &[])
        }
        Frame::Unknown { msg_type } => {
            warn!("Rejected unknown message type {msg_type:#06x}");
            Reaction::reply(libc::EPERM, &[])
        }
    }
}

fn run_receive(shared: &Shared, listener: UnixListener) {
    debug!("Receive loop started");
    for incoming in listener.incoming() {
        if !shared.running() {
            break;
        }
        let stream = match incoming {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Listener failed: {e}");
                peer_gone(shared);
                break;
            }
        };
        match stream.try_clone() {
            Ok(clone) => *shared.active.lock() = Some(clone),
            Err(e) => {
                warn!("Cannot track peer connection: {e}");
                continue;
            }
        }
        if !shared.running() {
            break;
        }

        debug!("Peer attached to {}", shared.session.local_path().display());
        serve_connection(shared, stream);
        *shared.active.lock() = None;

        if shared.running() {
            peer_gone(shared);
        }
    }
    debug!("Receive loop finished");
}

/// Serve one peer connection until it ends.
fn serve_connection(shared: &Shared, mut stream: UnixStream) {
    if let Err(e) = stream.set_write_timeout(Some(shared.io_timeout)) {
        warn!("Cannot set write timeout: {e}");
    }
    let role = shared.session.role();

    loop {
        let frame = match wire::read_frame(&mut stream) {
            Ok(frame) => frame,
            Err(e) if e.is_transport() => {
                debug!("Peer connection ended: {e}");
                return;
            }
            Err(e) => {
                warn!("Dropping peer connection: {e}");
                return;
            }
        };

        let reaction = react(frame, role);
        if let Some((status, payload)) = reaction.reply {
            if let Err(e) = wire::write_reply(&mut stream, status, payload) {
                warn!("Reply to peer failed: {e}");
                return;
            }
        }
        for event in reaction.events {
            shared.self_loop.send(event, Origin::Peer);
        }
        if reaction.disconnect {
            info!("Peer announced disconnect");
            return;
        }
    }
}

fn peer_gone(shared: &Shared) {
    shared.session.disconnect();
    warn!("Connection to peer lost");
    shared
        .self_loop
        .send(Event::new(EventKind::ConnectionLost), Origin::Local);
}

// ─── Link thread ────────────────────────────────────────────────────

fn run_link(shared: &Shared) {
    let mut ever_connected = false;
    let mut reported = false;
    while shared.running() {
        if !shared.session.has_link() {
            match shared.session.connect() {
                Ok(()) => {
                    if ever_connected {
                        info!("Connection to peer reestablished");
                        shared.self_loop.send(
                            Event::new(EventKind::ConnectionReestablished),
                            Origin::Local,
                        );
                    }
                    ever_connected = true;
                    reported = false;
                }
                Err(e) if !reported => {
                    warn!(
                        "Peer {} not reachable, retrying every {:?}: {e}",
                        shared.session.peer_path().display(),
                        shared.retry_interval
                    );
                    reported = true;
                }
                Err(e) => debug!("Rendezvous failed: {e}"),
            }
        }

        let mut guard = shared.link_lock.lock();
        if !shared.running() {
            break;
        }
        shared.link_wake.wait_for(&mut guard, shared.retry_interval);
    }
    debug!("Link thread finished");
}
