//! In-process publish/subscribe registry.
//!
//! Delivery is synchronous, in subscription order, on the calling thread.
//! In a running node the only caller is the bridge's dispatch thread, so
//! every subscriber runs serialized on that thread.

use parking_lot::RwLock;
use sorter_common::event::{Event, EventKind};
use sorter_common::role::Role;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

/// Subscriber callback.
pub type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Where an event entered the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Injected on this node (drivers, watchdog, actions, housekeeping).
    Local,
    /// Received from the peer node.
    Peer,
}

/// Result of the inbound filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Passed the filters and was published.
    Delivered,
    /// Peer's heartbeat kind injected locally; dropped.
    Rebound,
    /// This node's own heartbeat kind; never delivered locally.
    OwnHeartbeat,
}

/// Sink for events produced outside the bus (sensors, watchdog, actions).
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: Event);
}

/// Event Bus.
pub struct EventBus {
    role: Role,
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Callback)>>>,
}

impl EventBus {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Register `callback` for `kind`. Duplicates are allowed and all fire.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_arc(kind, Arc::new(callback))
    }

    fn subscribe_arc(&self, kind: EventKind, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, callback));
        debug!("Subscribed {id:?} to {kind}");
        id
    }

    /// Register `callback` for every kind in [`EventKind::ALL`].
    ///
    /// Returns the number of subscriptions made.
    pub fn subscribe_all<F>(&self, callback: F) -> usize
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        for kind in EventKind::ALL {
            self.subscribe_arc(kind, Arc::clone(&callback));
        }
        EventKind::ALL.len()
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subscribers.remove(&kind);
        }
        removed
    }

    /// Number of callbacks registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every subscriber of its kind.
    ///
    /// The registry lock is released before the first callback runs. A
    /// panicking subscriber is logged and the remaining ones still run.
    pub fn publish_local(&self, event: Event) {
        let callbacks: Vec<Callback> = match self.subscribers.read().get(&event.kind) {
            Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            None => {
                debug!("No subscribers for {event}");
                return;
            }
        };

        for callback in callbacks {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(&event);
            }));
            if let Err(e) = result {
                let msg = if let Some(s) = e.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = e.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                error!("Subscriber of {} panicked: {}", event.kind, msg);
            }
        }
    }

    /// Apply the heartbeat filters, then publish.
    pub fn dispatch_inbound(&self, event: Event, origin: Origin) -> Verdict {
        let verdict = self.filter(event.kind, origin);
        match verdict {
            Verdict::Delivered => self.publish_local(event),
            Verdict::Rebound => debug!("Dropped rebound {}", event.kind),
            Verdict::OwnHeartbeat => {}
        }
        verdict
    }

    fn filter(&self, kind: EventKind, origin: Origin) -> Verdict {
        if origin == Origin::Local && kind == self.role.peer_heartbeat() {
            Verdict::Rebound
        } else if kind == self.role.own_heartbeat() {
            Verdict::OwnHeartbeat
        } else {
            Verdict::Delivered
        }
    }
}

/// Synchronous local delivery, used where no bridge is running.
impl EventHandler for EventBus {
    fn handle_event(&self, event: Event) {
        self.dispatch_inbound(event, Origin::Local);
    }
}

impl<T: EventHandler + ?Sized> EventHandler for Arc<T> {
    fn handle_event(&self, event: Event) {
        (**self).handle_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(bus: &EventBus, kind: EventKind, tag: u32, log: &Arc<Mutex<Vec<u32>>>) {
        let log = Arc::clone(log);
        bus.subscribe(kind, move |_| log.lock().push(tag));
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new(Role::Master);
        bus.publish_local(Event::new(EventKind::StartMShort));
        assert_eq!(bus.subscriber_count(EventKind::StartMShort), 0);
    }

    #[test]
    fn duplicates_fire_in_registration_order() {
        let bus = EventBus::new(Role::Master);
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, EventKind::StopMPressed, 1, &log);
        recorder(&bus, EventKind::StopMPressed, 2, &log);
        recorder(&bus, EventKind::StopMPressed, 1, &log);

        bus.publish_local(Event::new(EventKind::StopMPressed));
        assert_eq!(*log.lock(), vec![1, 2, 1]);
    }

    #[test]
    fn unsubscribe_removes_only_that_subscription() {
        let bus = EventBus::new(Role::Slave);
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let a = bus.subscribe(EventKind::SortS, move |_| *h.lock() += 1);
        let h = Arc::clone(&hits);
        bus.subscribe(EventKind::SortS, move |_| *h.lock() += 10);

        assert!(bus.unsubscribe(EventKind::SortS, a));
        assert!(!bus.unsubscribe(EventKind::SortS, a));
        bus.publish_local(Event::new(EventKind::SortS));
        assert_eq!(*hits.lock(), 10);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_delivery() {
        let bus = EventBus::new(Role::Master);
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::ResetMPressed, |_| panic!("broken subscriber"));
        recorder(&bus, EventKind::ResetMPressed, 7, &log);

        bus.publish_local(Event::new(EventKind::ResetMPressed));
        assert_eq!(*log.lock(), vec![7]);
    }

    #[test]
    fn callback_may_subscribe_during_delivery() {
        let bus = Arc::new(EventBus::new(Role::Master));
        let inner = Arc::clone(&bus);
        bus.subscribe(EventKind::StartMLong, move |_| {
            inner.subscribe(EventKind::StartMLong, |_| {});
        });

        bus.publish_local(Event::new(EventKind::StartMLong));
        assert_eq!(bus.subscriber_count(EventKind::StartMLong), 2);
    }

    #[test]
    fn subscribe_all_covers_every_kind() {
        let bus = EventBus::new(Role::Master);
        let n = bus.subscribe_all(|_| {});
        assert_eq!(n, EventKind::ALL.len());
        for kind in EventKind::ALL {
            assert_eq!(bus.subscriber_count(kind), 1);
        }
    }

    #[test]
    fn heartbeat_filters_per_role_and_origin() {
        for role in [Role::Master, Role::Slave] {
            let bus = EventBus::new(role);
            let own = Event::new(role.own_heartbeat());
            let peer = Event::new(role.peer_heartbeat());

            assert_eq!(bus.dispatch_inbound(own, Origin::Local), Verdict::OwnHeartbeat);
            assert_eq!(bus.dispatch_inbound(own, Origin::Peer), Verdict::OwnHeartbeat);
            assert_eq!(bus.dispatch_inbound(peer, Origin::Local), Verdict::Rebound);
            assert_eq!(bus.dispatch_inbound(peer, Origin::Peer), Verdict::Delivered);
        }
    }
}
