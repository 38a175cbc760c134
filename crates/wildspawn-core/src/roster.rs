//! Tracked players and their spawn queues.
//!
//! Each logged-in player owns exactly one FIFO [`SpawnQueue`] of
//! [`SpawnCandidate`]s. The [`PlayerRoster`] keeps players in login order
//! and hands out round-robin batches to the dispatcher. Logging out drops
//! the queue with whatever it still holds.

use std::collections::VecDeque;

use wildspawn_types::{MapId, PlayerId, Point3D};

/// A tracked player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Player identity.
    pub id: PlayerId,
    /// Current map. [`MapId::INTERNAL`] means parked out of the world.
    pub map: MapId,
    /// Current location.
    pub location: Point3D,
    /// Staff accounts may receive debug placeholder spawns.
    pub staff: bool,
    /// Criminal (flagged) status, read by the aggro policy.
    pub criminal: bool,
}

impl Player {
    /// A non-staff, non-criminal player at `location` on `map`.
    pub const fn new(id: PlayerId, map: MapId, location: Point3D) -> Self {
        Self {
            id,
            map,
            location,
            staff: false,
            criminal: false,
        }
    }

    /// Whether the player can anchor spawns (not parked on the internal map).
    pub const fn is_valid(&self) -> bool {
        !self.map.is_internal()
    }
}

/// A creature name waiting to be placed at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCandidate {
    /// Raw rule entry.
    pub name: String,
    /// Target map.
    pub map: MapId,
    /// Target location.
    pub location: Point3D,
}

/// FIFO of spawn candidates for one player.
#[derive(Debug, Clone, Default)]
pub struct SpawnQueue {
    items: VecDeque<SpawnCandidate>,
}

impl SpawnQueue {
    /// Append a candidate.
    pub fn push(&mut self, candidate: SpawnCandidate) {
        self.items.push_back(candidate);
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pop the oldest candidate still within `range` of `center` on `map`.
    ///
    /// Candidates ahead of it are discarded. When nothing qualifies the
    /// queue is emptied. Returns the candidate (if any) and the number
    /// discarded.
    pub fn take_first_in_range(
        &mut self,
        map: MapId,
        center: Point3D,
        range: f64,
    ) -> (Option<SpawnCandidate>, usize) {
        let mut discarded: usize = 0;
        while let Some(candidate) = self.items.pop_front() {
            if candidate.map == map && center.in_range(&candidate.location, range) {
                return (Some(candidate), discarded);
            }
            discarded = discarded.saturating_add(1);
        }
        (None, discarded)
    }
}

/// A player and the queue it owns.
#[derive(Debug, Clone)]
pub struct TrackedPlayer {
    /// The player.
    pub player: Player,
    /// The player's spawn queue.
    pub queue: SpawnQueue,
}

/// One round-robin slice of the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterBatch {
    /// Players to process, in order.
    pub players: Vec<PlayerId>,
    /// The cursor wrapped past the end of the roster during this batch.
    pub pass_completed: bool,
}

/// All tracked players in login order with a round-robin cursor.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: Vec<TrackedPlayer>,
    cursor: usize,
}

impl PlayerRoster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `player` with an empty queue. A player who is already
    /// tracked keeps their queue and has their details refreshed. Returns
    /// true if the player was newly added.
    pub fn login(&mut self, player: Player) -> bool {
        if let Some(tracked) = self.get_mut(player.id) {
            tracked.player = player;
            return false;
        }
        self.players.push(TrackedPlayer {
            player,
            queue: SpawnQueue::default(),
        });
        true
    }

    /// Stop tracking `id`, discarding the queue. Returns how many
    /// candidates were dropped, or `None` if the player was not tracked.
    pub fn logout(&mut self, id: PlayerId) -> Option<usize> {
        let idx = self.players.iter().position(|t| t.player.id == id)?;
        let removed = self.players.remove(idx);
        if idx < self.cursor {
            self.cursor = self.cursor.saturating_sub(1);
        }
        if self.cursor >= self.players.len() {
            self.cursor = 0;
        }
        Some(removed.queue.len())
    }

    /// Update a tracked player's position. Returns false if not tracked.
    pub fn move_player(&mut self, id: PlayerId, map: MapId, location: Point3D) -> bool {
        match self.get_mut(id) {
            Some(tracked) => {
                tracked.player.map = map;
                tracked.player.location = location;
                true
            }
            None => false,
        }
    }

    /// Look up a tracked player.
    pub fn get(&self, id: PlayerId) -> Option<&TrackedPlayer> {
        self.players.iter().find(|t| t.player.id == id)
    }

    /// Look up a tracked player mutably.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut TrackedPlayer> {
        self.players.iter_mut().find(|t| t.player.id == id)
    }

    /// Number of tracked players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player is tracked.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players not parked on the internal map.
    pub fn valid_players(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .map(|t| &t.player)
            .filter(|p| p.is_valid())
    }

    /// Total candidates queued across all players.
    pub fn queued_total(&self) -> usize {
        self.players.iter().map(|t| t.queue.len()).sum()
    }

    /// Empty every player's queue, keeping the players tracked.
    pub fn clear_queues(&mut self) -> usize {
        let mut dropped: usize = 0;
        for tracked in &mut self.players {
            dropped = dropped.saturating_add(tracked.queue.len());
            tracked.queue = SpawnQueue::default();
        }
        dropped
    }

    /// Advance the cursor over up to `size` players, wrapping at the end.
    pub fn next_batch(&mut self, size: usize) -> RosterBatch {
        let len = self.players.len();
        let mut batch = RosterBatch {
            players: Vec::with_capacity(size.min(len)),
            pass_completed: false,
        };
        if len == 0 {
            self.cursor = 0;
            return batch;
        }
        for _ in 0..size.min(len) {
            if let Some(tracked) = self.players.get(self.cursor) {
                batch.players.push(tracked.player.id);
            }
            self.cursor = self.cursor.saturating_add(1);
            if self.cursor >= len {
                self.cursor = 0;
                batch.pass_completed = true;
            }
        }
        batch
    }
}
