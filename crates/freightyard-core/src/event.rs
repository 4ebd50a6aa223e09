//! Station change events and the notifier that fans them out.
//!
//! The job board emits a [`StationChanged`] for every station whose visible
//! job list may have changed. Events go through the [`ChangeSink`] trait; the
//! production sink is a [`NotifierHandle`] feeding a [`ChangeNotifier`].
//!
//! # Worker model
//!
//! One worker thread owns the subscriber table and handles commands from a
//! single bounded inbox strictly in order, so the table needs no lock.
//! Delivery never blocks the worker: each subscriber has a bounded outbox
//! filled with `try_send`. A full outbox loses that event; a disconnected one
//! removes the subscriber. Publishing waits at most the configured timeout
//! for inbox space before dropping the event.

use crate::config::NotifierConfig;
use crate::id::{StationId, Username};
use crossbeam_channel::{
    Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError, bounded,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Events and sinks
// ---------------------------------------------------------------------------

/// "This station's job list may have changed, re-fetch it."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationChanged {
    pub station_id: StationId,
}

impl StationChanged {
    pub fn new(station_id: StationId) -> Self {
        Self { station_id }
    }
}

#[cfg(feature = "wire")]
impl StationChanged {
    /// Wire form: `{"station_id":"SM"}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Receiver of station change events emitted by the job board.
///
/// Called while the job mutex is held, so implementations must not block
/// for long.
pub trait ChangeSink: Send + Sync {
    fn station_changed(&self, event: StationChanged);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn station_changed(&self, _event: StationChanged) {}
}

// ---------------------------------------------------------------------------
// Errors and stats
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("subscriber username must not be empty")]
    EmptyUsername,
    #[error("notifier has shut down")]
    Closed,
    #[error("notifier inbox full")]
    Busy,
    #[error("could not start notifier worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Counters shared between the worker and its handles.
#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped_full: AtomicU64,
    dropped_timeout: AtomicU64,
    pruned_subscribers: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the notifier counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierStats {
    /// Events the worker received.
    pub published: u64,
    /// Events placed in a subscriber outbox.
    pub delivered: u64,
    /// Events lost to a full outbox.
    pub dropped_full: u64,
    /// Events dropped because the inbox stayed full past the timeout.
    pub dropped_timeout: u64,
    /// Subscribers removed after their outbox disconnected.
    pub pruned_subscribers: u64,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Identifies one joined subscriber. A user may join more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

/// A joined subscriber's end of the notifier. Dropping it disconnects the
/// outbox; the worker prunes the subscriber on its next delivery attempt.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    username: Username,
    events: Receiver<StationChanged>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn events(&self) -> &Receiver<StationChanged> {
        &self.events
    }

    /// Every event already waiting in the outbox.
    pub fn drain(&self) -> Vec<StationChanged> {
        self.events.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<StationChanged> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Roster entry: who is joined and what they watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberInfo {
    pub id: SubscriberId,
    pub username: Username,
    pub stations: Vec<StationId>,
}

enum Command {
    Join {
        id: SubscriberId,
        username: Username,
        outbox: Sender<StationChanged>,
    },
    Subscribe {
        id: SubscriberId,
        station: StationId,
    },
    Unsubscribe {
        id: SubscriberId,
        station: StationId,
    },
    Leave {
        id: SubscriberId,
    },
    Publish(StationChanged),
    Roster {
        reply: Sender<Vec<SubscriberInfo>>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable entry point to a running [`ChangeNotifier`].
#[derive(Clone)]
pub struct NotifierHandle {
    inbox: Sender<Command>,
    counters: Arc<Counters>,
    next_id: Arc<AtomicU64>,
    config: NotifierConfig,
}

impl NotifierHandle {
    /// Register a subscriber. It receives nothing until it subscribes to a
    /// station.
    pub fn join(&self, username: &str) -> Result<Subscription, NotifierError> {
        let username = Username::new(username).map_err(|_| NotifierError::EmptyUsername)?;
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (outbox, events) = bounded(self.config.outbox_capacity);
        self.command(Command::Join {
            id,
            username: username.clone(),
            outbox,
        })?;
        Ok(Subscription {
            id,
            username,
            events,
        })
    }

    pub fn subscribe(&self, id: SubscriberId, station: StationId) -> Result<(), NotifierError> {
        self.command(Command::Subscribe { id, station })
    }

    pub fn unsubscribe(&self, id: SubscriberId, station: StationId) -> Result<(), NotifierError> {
        self.command(Command::Unsubscribe { id, station })
    }

    pub fn leave(&self, id: SubscriberId) -> Result<(), NotifierError> {
        self.command(Command::Leave { id })
    }

    /// Current subscribers, in join order.
    pub fn roster(&self) -> Result<Vec<SubscriberInfo>, NotifierError> {
        let (reply, rx) = bounded(1);
        self.command(Command::Roster { reply })?;
        rx.recv().map_err(|_| NotifierError::Closed)
    }

    /// Queue an event for fan-out. Returns whether it was accepted.
    pub fn publish(&self, event: StationChanged) -> bool {
        match self
            .inbox
            .send_timeout(Command::Publish(event), self.config.publish_timeout())
        {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                Counters::bump(&self.counters.dropped_timeout);
                tracing::warn!(station_id = %event.station_id, "notifier inbox full; event dropped");
                false
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                tracing::debug!(station_id = %event.station_id, "notifier stopped; event dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> NotifierStats {
        let c = &self.counters;
        NotifierStats {
            published: c.published.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            dropped_full: c.dropped_full.load(Ordering::Relaxed),
            dropped_timeout: c.dropped_timeout.load(Ordering::Relaxed),
            pruned_subscribers: c.pruned_subscribers.load(Ordering::Relaxed),
        }
    }

    fn command(&self, command: Command) -> Result<(), NotifierError> {
        self.inbox
            .send_timeout(command, self.config.publish_timeout())
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => NotifierError::Busy,
                SendTimeoutError::Disconnected(_) => NotifierError::Closed,
            })
    }
}

impl ChangeSink for NotifierHandle {
    fn station_changed(&self, event: StationChanged) {
        self.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Owner of the notifier worker thread. Dropping it shuts the worker down.
pub struct ChangeNotifier {
    handle: NotifierHandle,
    worker: Option<JoinHandle<()>>,
}

impl ChangeNotifier {
    pub fn spawn(config: NotifierConfig) -> Result<Self, NotifierError> {
        let (inbox, commands) = bounded(config.inbox_capacity);
        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);
        let worker = std::thread::Builder::new()
            .name("freightyard-notifier".into())
            .spawn(move || run(commands, &worker_counters))?;

        Ok(Self {
            handle: NotifierHandle {
                inbox,
                counters,
                next_id: Arc::new(AtomicU64::new(1)),
                config,
            },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> NotifierHandle {
        self.handle.clone()
    }

    /// Stop the worker after it has handled everything already queued.
    pub fn shutdown(mut self) -> NotifierStats {
        self.stop();
        self.handle.stats()
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            // A send error means the worker is already gone.
            let _ = self.handle.inbox.send(Command::Shutdown);
            if worker.join().is_err() {
                tracing::error!("notifier worker panicked");
            }
        }
    }
}

impl Drop for ChangeNotifier {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Subscriber {
    username: Username,
    stations: BTreeSet<StationId>,
    outbox: Sender<StationChanged>,
}

fn run(commands: Receiver<Command>, counters: &Counters) {
    let mut subscribers: BTreeMap<SubscriberId, Subscriber> = BTreeMap::new();
    tracing::debug!("notifier worker started");

    for command in commands.iter() {
        match command {
            Command::Join {
                id,
                username,
                outbox,
            } => {
                tracing::info!(user = %username, subscriber = id.0, "subscriber joined");
                subscribers.insert(
                    id,
                    Subscriber {
                        username,
                        stations: BTreeSet::new(),
                        outbox,
                    },
                );
            }
            Command::Subscribe { id, station } => match subscribers.get_mut(&id) {
                Some(sub) => {
                    sub.stations.insert(station);
                }
                None => tracing::debug!(subscriber = id.0, "subscribe from unknown subscriber"),
            },
            Command::Unsubscribe { id, station } => {
                if let Some(sub) = subscribers.get_mut(&id) {
                    sub.stations.remove(&station);
                }
            }
            Command::Leave { id } => {
                if let Some(sub) = subscribers.remove(&id) {
                    tracing::info!(user = %sub.username, subscriber = id.0, "subscriber left");
                }
            }
            Command::Publish(event) => {
                Counters::bump(&counters.published);
                fan_out(&mut subscribers, event, counters);
            }
            Command::Roster { reply } => {
                let roster = subscribers
                    .iter()
                    .map(|(id, sub)| SubscriberInfo {
                        id: *id,
                        username: sub.username.clone(),
                        stations: sub.stations.iter().copied().collect(),
                    })
                    .collect();
                let _ = reply.send(roster);
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("notifier worker stopped");
}

fn fan_out(
    subscribers: &mut BTreeMap<SubscriberId, Subscriber>,
    event: StationChanged,
    counters: &Counters,
) {
    subscribers.retain(|id, sub| {
        if !sub.stations.contains(&event.station_id) {
            return true;
        }
        match sub.outbox.try_send(event) {
            Ok(()) => {
                Counters::bump(&counters.delivered);
                true
            }
            Err(TrySendError::Full(_)) => {
                Counters::bump(&counters.dropped_full);
                tracing::debug!(user = %sub.username, station_id = %event.station_id, "outbox full; event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                Counters::bump(&counters.pruned_subscribers);
                tracing::info!(user = %sub.username, subscriber = id.0, "subscriber disconnected; removed");
                false
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    fn notifier(outbox_capacity: usize) -> ChangeNotifier {
        ChangeNotifier::spawn(NotifierConfig {
            outbox_capacity,
            ..NotifierConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_username_rejected() {
        let n = notifier(4);
        assert!(matches!(
            n.handle().join("  "),
            Err(NotifierError::EmptyUsername)
        ));
    }

    #[test]
    fn delivers_only_subscribed_stations() {
        let n = notifier(4);
        let h = n.handle();
        let sub = h.join("alice").unwrap();
        h.subscribe(sub.id(), StationId::Sm).unwrap();

        h.publish(StationChanged::new(StationId::Cm));
        h.publish(StationChanged::new(StationId::Sm));

        assert_eq!(
            sub.next_event(WAIT),
            Some(StationChanged::new(StationId::Sm))
        );
        // Roster round-trip orders after both publishes.
        h.roster().unwrap();
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let n = notifier(4);
        let h = n.handle();
        let sub = h.join("bob").unwrap();
        h.subscribe(sub.id(), StationId::Hb).unwrap();
        h.unsubscribe(sub.id(), StationId::Hb).unwrap();
        h.publish(StationChanged::new(StationId::Hb));
        h.roster().unwrap();
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn full_outbox_drops_and_counts() {
        let n = notifier(1);
        let h = n.handle();
        let sub = h.join("slow").unwrap();
        h.subscribe(sub.id(), StationId::Ff).unwrap();
        for _ in 0..3 {
            h.publish(StationChanged::new(StationId::Ff));
        }
        let roster = h.roster().unwrap();
        assert_eq!(roster.len(), 1);

        let stats = h.stats();
        assert_eq!(stats.published, 3);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped_full, 2);
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn disconnected_subscriber_pruned() {
        let n = notifier(4);
        let h = n.handle();
        let sub = h.join("gone").unwrap();
        h.subscribe(sub.id(), StationId::Gf).unwrap();
        drop(sub);

        h.publish(StationChanged::new(StationId::Gf));
        assert!(h.roster().unwrap().is_empty());
        assert_eq!(h.stats().pruned_subscribers, 1);
    }

    #[test]
    fn roster_lists_subscriptions() {
        let n = notifier(4);
        let h = n.handle();
        let a = h.join("alice").unwrap();
        let b = h.join("bob").unwrap();
        h.subscribe(a.id(), StationId::Sw).unwrap();
        h.subscribe(a.id(), StationId::Csw).unwrap();
        h.leave(b.id()).unwrap();

        let roster = h.roster().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].username.as_str(), "alice");
        assert_eq!(roster[0].stations, vec![StationId::Csw, StationId::Sw]);
    }

    #[test]
    fn handle_after_shutdown_reports_closed() {
        let n = notifier(4);
        let h = n.handle();
        n.shutdown();
        assert!(!h.publish(StationChanged::new(StationId::Sm)));
        assert!(matches!(h.join("late"), Err(NotifierError::Closed)));
    }

    #[cfg(feature = "wire")]
    #[test]
    fn wire_shape() {
        let json = StationChanged::new(StationId::Sm).to_json().unwrap();
        assert_eq!(json, r#"{"station_id":"SM"}"#);
        assert_eq!(
            StationChanged::from_json(&json).unwrap().station_id,
            StationId::Sm
        );
    }
}
