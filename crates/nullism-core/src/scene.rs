//! Client-side view of the ritual.
//!
//! [`OrbitScene`] is what a browser tab keeps in memory: the locally dragged
//! avatar, every other participant as a [`WorshipperActor`], and the counters
//! the server pushes. It is transport-agnostic; the embedding client feeds
//! it pointer samples, server events and HTTP responses, and carries out the
//! [`ClientAction`]s it returns.

use rand::Rng;
use std::collections::BTreeMap;

use crate::geometry::OrbitGeometry;
use crate::gesture::OrbitGesture;
use crate::participant::ConnectionId;
use crate::protocol::{CounterResponse, IncrementResponse, ServerEvent};
use crate::worshipper::WorshipperActor;

/// Half-size of a remote worshipper's on-screen element, in pixels.
pub const WORSHIPPER_OFFSET: f64 = 15.0;

/// Side effects the embedding client must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    /// Send `orbitCompleted` on the realtime channel.
    EmitOrbitCompleted,
    /// `POST /api/increment` and hand the outcome back to the scene.
    RequestIncrement,
}

/// Everything one client renders.
#[derive(Debug)]
pub struct OrbitScene {
    width: f64,
    height: f64,
    geometry: OrbitGeometry,
    gesture: OrbitGesture,
    local_connection: Option<ConnectionId>,
    worshippers: BTreeMap<ConnectionId, WorshipperActor>,
    roster_order: Vec<ConnectionId>,
    user_count: usize,
    total_visits: u64,
    global_orbits: Option<u64>,
    personal_orbits: u64,
    last_message: Option<String>,
}

impl OrbitScene {
    /// New scene for a `width` × `height` viewport.
    ///
    /// `personal_orbits` is whatever the client kept locally from earlier
    /// visits.
    pub fn new(width: f64, height: f64, personal_orbits: u64) -> Self {
        Self {
            width,
            height,
            geometry: OrbitGeometry::fit(width, height, false),
            gesture: OrbitGesture::default(),
            local_connection: None,
            worshippers: BTreeMap::new(),
            roster_order: Vec::new(),
            user_count: 0,
            total_visits: 0,
            global_orbits: None,
            personal_orbits,
            last_message: None,
        }
    }

    /// Viewport changed size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.geometry = OrbitGeometry::fit(width, height, self.geometry.wider);
    }

    /// Apply one server event.
    pub fn apply<R: Rng + ?Sized>(&mut self, event: ServerEvent, rng: &mut R) {
        match event {
            ServerEvent::Connected(id) => {
                tracing::debug!(connection = %id, "connected");
                self.worshippers.remove(&id);
                self.roster_order.retain(|c| c != &id);
                self.local_connection = Some(id);
            }
            ServerEvent::UserCount(count) => {
                self.user_count = count;
                let wider = OrbitGeometry::wants_wider(count);
                self.geometry = OrbitGeometry::fit(self.width, self.height, wider);
            }
            ServerEvent::TotalVisits(visits) => {
                self.total_visits = visits;
            }
            ServerEvent::UsersData(participants) => {
                self.worshippers.clear();
                self.roster_order.clear();
                for participant in participants {
                    if Some(&participant.connection_id) == self.local_connection.as_ref() {
                        continue;
                    }
                    let id = participant.connection_id.clone();
                    self.roster_order.push(id.clone());
                    self.worshippers
                        .insert(id, WorshipperActor::new(participant, rng));
                }
                tracing::debug!(worshippers = self.worshippers.len(), "roster applied");
            }
        }
    }

    /// Pointer pressed on the avatar, in viewport coordinates.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let (lx, ly) = self.geometry.to_local(x, y);
        self.gesture.begin(lx, ly);
    }

    /// Pointer moved, in viewport coordinates.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Vec<ClientAction> {
        let (lx, ly) = self.geometry.to_local(x, y);
        match self.gesture.update(lx, ly) {
            Some(_) => {
                self.personal_orbits += 1;
                vec![
                    ClientAction::EmitOrbitCompleted,
                    ClientAction::RequestIncrement,
                ]
            }
            None => Vec::new(),
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        self.gesture.end();
    }

    /// Advance every remote worshipper by one frame.
    pub fn tick<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        for worshipper in self.worshippers.values_mut() {
            worshipper.tick(now_ms, rng);
        }
    }

    /// The server accepted an increment.
    pub fn on_increment(&mut self, response: IncrementResponse) {
        self.global_orbits = Some(response.orbits);
        self.last_message = Some(response.message);
    }

    /// The increment request failed; nothing is retried or shown.
    pub fn on_increment_failed(&mut self, reason: &str) {
        tracing::warn!(%reason, "failed to increment global counter");
    }

    /// Result of `GET /api/counter`.
    pub fn on_counter(&mut self, response: CounterResponse) {
        self.global_orbits = Some(response.orbits);
    }

    /// Top-left corner for the local avatar element of half-size `offset`.
    pub fn avatar_position(&self, offset: f64) -> (f64, f64) {
        self.geometry.place(self.gesture.current_angle(), offset)
    }

    /// Remote worshippers in roster order with their top-left corners.
    pub fn worshipper_positions(&self) -> impl Iterator<Item = (&WorshipperActor, (f64, f64))> {
        self.roster_order.iter().filter_map(move |id| {
            self.worshippers
                .get(id)
                .map(|w| (w, self.geometry.place(w.position(), WORSHIPPER_OFFSET)))
        })
    }

    pub fn worshipper(&self, id: &ConnectionId) -> Option<&WorshipperActor> {
        self.worshippers.get(id)
    }

    pub fn worshipper_count(&self) -> usize {
        self.worshippers.len()
    }

    pub fn local_connection(&self) -> Option<&ConnectionId> {
        self.local_connection.as_ref()
    }

    pub fn geometry(&self) -> &OrbitGeometry {
        &self.geometry
    }

    pub fn progress_percent(&self) -> f64 {
        self.gesture.progress_percent()
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn total_visits(&self) -> u64 {
        self.total_visits
    }

    pub fn global_orbits(&self) -> Option<u64> {
        self.global_orbits
    }

    pub fn personal_orbits(&self) -> u64 {
        self.personal_orbits
    }

    /// Latest celebration line, shown until the next one replaces it.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }
}
