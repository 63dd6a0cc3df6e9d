//! Authoritative roster of connected participants and its fan-out.
//!
//! Every membership change rebroadcasts the whole roster instead of a diff,
//! so any client that applies the latest `usersData` holds exactly the
//! current roster.
//!
//! All outgoing events go through one ordered broadcast channel. Each item
//! carries an [`Audience`]; a connection forwards only what is addressed to
//! it. Events are published while the roster lock is held, so every
//! connection observes membership changes in the same order.

use chrono::Utc;
use nullism_core::{ConnectionId, Participant, ParticipantId, ServerEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::counter::VisitCounter;

/// Buffered events per subscriber before it is considered lagging.
pub const DISPATCH_CAPACITY: usize = 256;

/// Who an event is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    Only(ConnectionId),
}

/// One outgoing event and its audience.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Dispatch {
    /// Whether `connection` should receive this event.
    pub fn is_for(&self, connection: &ConnectionId) -> bool {
        match &self.audience {
            Audience::All => true,
            Audience::Only(target) => target == connection,
        }
    }
}

/// Live participants in join order.
#[derive(Debug, Default)]
pub struct Roster {
    participants: BTreeMap<ParticipantId, Participant>,
    by_connection: HashMap<ConnectionId, ParticipantId>,
    last_id: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and insert a participant for `connection`.
    ///
    /// A connection that is already present is replaced.
    pub fn admit(&mut self, connection: ConnectionId, rng: &mut StdRng) -> &Participant {
        self.remove(&connection);

        self.last_id += 1;
        let id = ParticipantId(self.last_id);
        let participant = Participant::spawn(id, connection.clone(), Utc::now(), rng);

        self.by_connection.insert(connection, id);
        self.participants.entry(id).or_insert(participant)
    }

    /// Remove the participant bound to `connection`.
    pub fn remove(&mut self, connection: &ConnectionId) -> Option<Participant> {
        let id = self.by_connection.remove(connection)?;
        self.participants.remove(&id)
    }

    /// Tally a reported orbit. `None` for unknown connections.
    pub fn record_orbit(&mut self, connection: &ConnectionId) -> Option<u64> {
        let id = self.by_connection.get(connection)?;
        self.participants.get_mut(id).map(Participant::record_orbit)
    }

    pub fn get(&self, connection: &ConnectionId) -> Option<&Participant> {
        let id = self.by_connection.get(connection)?;
        self.participants.get(id)
    }

    /// Every participant, in join order.
    pub fn snapshot(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

struct RosterState {
    roster: Roster,
    rng: StdRng,
}

/// Owns the roster and publishes every change to all connections.
pub struct RosterBroadcaster {
    state: Mutex<RosterState>,
    visits: VisitCounter,
    dispatch_tx: broadcast::Sender<Dispatch>,
}

impl RosterBroadcaster {
    /// Create a broadcaster with an entropy-seeded random source.
    pub fn new(visits: VisitCounter) -> Self {
        Self::with_rng(visits, StdRng::from_entropy())
    }

    /// Create a broadcaster drawing participant attributes from `rng`.
    pub fn with_rng(visits: VisitCounter, rng: StdRng) -> Self {
        let (dispatch_tx, _) = broadcast::channel(DISPATCH_CAPACITY);
        Self {
            state: Mutex::new(RosterState {
                roster: Roster::new(),
                rng,
            }),
            visits,
            dispatch_tx,
        }
    }

    /// Replace the dispatch channel with one buffering `capacity` events.
    pub fn with_capacity(self, capacity: usize) -> Self {
        let (dispatch_tx, _) = broadcast::channel(capacity);
        Self { dispatch_tx, ..self }
    }

    /// Subscribe to outgoing events. Subscribe before `on_connect` so the
    /// joining connection sees its own join.
    pub fn subscribe(&self) -> broadcast::Receiver<Dispatch> {
        self.dispatch_tx.subscribe()
    }

    /// A connection opened.
    ///
    /// Publishes, in order: `userCount` and `totalVisits` to everyone, the
    /// roster to the new connection, and the roster to everyone.
    pub async fn on_connect(&self, connection: ConnectionId) -> Participant {
        let mut state = self.state.lock().await;
        let RosterState { roster, rng } = &mut *state;

        let participant = roster.admit(connection.clone(), rng).clone();
        let visits = self.visits.record_visit().await;
        let active = roster.len();

        info!(
            participant = %participant.id,
            active,
            total_visits = visits,
            "User {} connected", participant.id
        );

        let snapshot = roster.snapshot();
        self.publish(Audience::All, ServerEvent::UserCount(active));
        self.publish(Audience::All, ServerEvent::TotalVisits(visits));
        self.publish(
            Audience::Only(connection),
            ServerEvent::UsersData(snapshot.clone()),
        );
        self.publish_roster(snapshot);

        participant
    }

    /// A connection closed. Unknown connections publish nothing.
    pub async fn on_disconnect(&self, connection: &ConnectionId) -> Option<Participant> {
        let mut state = self.state.lock().await;
        let removed = state.roster.remove(connection)?;
        let active = state.roster.len();

        info!(
            participant = %removed.id,
            active,
            total_visits = self.visits.read(),
            "User {} disconnected", removed.id
        );

        self.publish(Audience::All, ServerEvent::UserCount(active));
        self.publish_roster(state.roster.snapshot());
        Some(removed)
    }

    /// A connection reported a finished orbit. Nothing is published.
    pub async fn on_completion_reported(&self, connection: &ConnectionId) -> Option<u64> {
        let mut state = self.state.lock().await;
        let total = state.roster.record_orbit(connection);
        debug!(%connection, ?total, "orbit reported");
        total
    }

    /// Send the current counts and roster to a single connection.
    pub async fn resync(&self, connection: &ConnectionId) {
        let state = self.state.lock().await;
        let target = Audience::Only(connection.clone());
        self.publish(target.clone(), ServerEvent::UserCount(state.roster.len()));
        self.publish(target.clone(), ServerEvent::TotalVisits(self.visits.read()));
        self.publish(target, ServerEvent::UsersData(state.roster.snapshot()));
    }

    /// Current roster, in join order.
    pub async fn snapshot(&self) -> Vec<Participant> {
        self.state.lock().await.roster.snapshot()
    }

    /// Look up one participant.
    pub async fn participant(&self, connection: &ConnectionId) -> Option<Participant> {
        self.state.lock().await.roster.get(connection).cloned()
    }

    pub async fn active_users(&self) -> usize {
        self.state.lock().await.roster.len()
    }

    pub fn total_visits(&self) -> u64 {
        self.visits.read()
    }

    fn publish_roster(&self, snapshot: Vec<Participant>) {
        debug!("Sending {} worshippers to clients", snapshot.len());
        self.publish(Audience::All, ServerEvent::UsersData(snapshot));
    }

    fn publish(&self, audience: Audience, event: ServerEvent) {
        // No subscribers means nobody is listening yet; not an error.
        let _ = self.dispatch_tx.send(Dispatch { audience, event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ScalarFile;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    async fn broadcaster() -> (RosterBroadcaster, TempDir) {
        let dir = tempdir().unwrap();
        let file = ScalarFile::new(dir.path().join(".total_visits"));
        let visits = VisitCounter::open(file, None).await;
        (
            RosterBroadcaster::with_rng(visits, StdRng::seed_from_u64(42)),
            dir,
        )
    }

    fn conn(name: &str) -> ConnectionId {
        ConnectionId::new(name)
    }

    fn drain(rx: &mut broadcast::Receiver<Dispatch>) -> Vec<Dispatch> {
        let mut out = Vec::new();
        while let Ok(dispatch) = rx.try_recv() {
            out.push(dispatch);
        }
        out
    }

    #[test]
    fn roster_ids_are_monotonic() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut roster = Roster::new();
        let a = roster.admit(conn("a"), &mut rng).id;
        let b = roster.admit(conn("b"), &mut rng).id;
        roster.remove(&conn("a"));
        let c = roster.admit(conn("c"), &mut rng).id;

        assert_eq!(a, ParticipantId(1));
        assert_eq!(b, ParticipantId(2));
        assert_eq!(c, ParticipantId(3));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn readmitting_a_connection_replaces_it() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut roster = Roster::new();
        roster.admit(conn("a"), &mut rng);
        roster.admit(conn("a"), &mut rng);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(&conn("a")).unwrap().id, ParticipantId(2));
    }

    #[test]
    fn dispatch_audience() {
        let all = Dispatch {
            audience: Audience::All,
            event: ServerEvent::UserCount(1),
        };
        let only = Dispatch {
            audience: Audience::Only(conn("a")),
            event: ServerEvent::UserCount(1),
        };
        assert!(all.is_for(&conn("a")));
        assert!(all.is_for(&conn("b")));
        assert!(only.is_for(&conn("a")));
        assert!(!only.is_for(&conn("b")));
    }

    #[tokio::test]
    async fn connect_publishes_in_order() {
        let (roster, _dir) = broadcaster().await;
        let mut rx = roster.subscribe();

        let joined = roster.on_connect(conn("a")).await;
        let events = drain(&mut rx);

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].event, ServerEvent::UserCount(1));
        assert_eq!(events[0].audience, Audience::All);
        assert_eq!(events[1].event, ServerEvent::TotalVisits(1));
        assert_eq!(events[2].audience, Audience::Only(conn("a")));
        assert_eq!(events[2].event, ServerEvent::UsersData(vec![joined.clone()]));
        assert_eq!(events[3].audience, Audience::All);
        assert_eq!(events[3].event, ServerEvent::UsersData(vec![joined]));
    }

    #[tokio::test]
    async fn disconnect_publishes_count_and_roster() {
        let (roster, _dir) = broadcaster().await;
        roster.on_connect(conn("a")).await;
        let b = roster.on_connect(conn("b")).await;

        let mut rx = roster.subscribe();
        roster.on_disconnect(&conn("a")).await.unwrap();
        let events = drain(&mut rx);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, ServerEvent::UserCount(1));
        assert_eq!(events[1].event, ServerEvent::UsersData(vec![b]));
        assert_eq!(roster.total_visits(), 2);
    }

    #[tokio::test]
    async fn unknown_disconnect_is_silent() {
        let (roster, _dir) = broadcaster().await;
        let mut rx = roster.subscribe();
        assert!(roster.on_disconnect(&conn("ghost")).await.is_none());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn roster_size_after_churn() {
        let (roster, _dir) = broadcaster().await;
        let connects = 12;
        let disconnects = 5;

        for i in 0..connects {
            roster.on_connect(conn(&format!("c{i}"))).await;
        }
        for i in 0..disconnects {
            roster.on_disconnect(&conn(&format!("c{}", i * 2))).await;
        }

        let snapshot = roster.snapshot().await;
        assert_eq!(snapshot.len(), connects - disconnects);
        let unique: HashSet<_> = snapshot.iter().map(|p| &p.connection_id).collect();
        assert_eq!(unique.len(), snapshot.len());
        assert_eq!(roster.active_users().await, connects - disconnects);
        assert_eq!(roster.total_visits(), connects as u64);

        // Join order preserved
        let ids: Vec<_> = snapshot.iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn completions_are_tallied_silently() {
        let (roster, _dir) = broadcaster().await;
        roster.on_connect(conn("a")).await;

        let mut rx = roster.subscribe();
        assert_eq!(roster.on_completion_reported(&conn("a")).await, Some(1));
        assert_eq!(roster.on_completion_reported(&conn("a")).await, Some(2));
        assert_eq!(roster.on_completion_reported(&conn("zzz")).await, None);
        assert!(drain(&mut rx).is_empty());

        let participant = roster.participant(&conn("a")).await.unwrap();
        assert_eq!(participant.orbits_completed, 2);
    }

    #[tokio::test]
    async fn resync_targets_one_connection() {
        let (roster, _dir) = broadcaster().await;
        roster.on_connect(conn("a")).await;
        roster.on_connect(conn("b")).await;

        let mut rx = roster.subscribe();
        roster.resync(&conn("b")).await;
        let events = drain(&mut rx);

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|d| d.audience == Audience::Only(conn("b"))));
        assert_eq!(events[0].event, ServerEvent::UserCount(2));
        assert_eq!(events[1].event, ServerEvent::TotalVisits(2));
        match &events[2].event {
            ServerEvent::UsersData(participants) => assert_eq!(participants.len(), 2),
            other => panic!("expected roster, got {other:?}"),
        }
    }
}
