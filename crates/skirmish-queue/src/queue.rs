//! The matchmaking queue: waiting players keyed by identity.

use std::collections::HashMap;

use skirmish_protocol::{PlayerId, RoomSlug};
use tokio::sync::mpsc;

use crate::DeckSummary;

/// Notifications delivered to a waiting player's connection actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// An opponent was found and a room has been created.
    Matched { room: RoomSlug },
}

/// Channel sender for reaching a waiting player's connection actor.
pub type QueueSender = mpsc::UnboundedSender<QueueEvent>;

/// One waiting player.
pub struct QueueEntry {
    pub player_id: PlayerId,
    /// The deck the player queued with, including unit placements —
    /// kept here so room creation doesn't re-fetch from the catalog.
    pub deck: DeckSummary,
    /// Direct line to the player's connection actor.
    pub sender: QueueSender,
    /// Monotonic join sequence; preserved across upserts so re-submitting
    /// a deck doesn't push a player to the back of the line.
    joined: u64,
}

impl QueueEntry {
    /// The score this entry is matched on.
    pub fn score(&self) -> i32 {
        self.deck.score
    }
}

/// The waiting-player store.
///
/// Invariant: at most one entry per player — joining again while waiting
/// replaces the deck and score in place, it never duplicates.
///
/// Match policy (documented, not incidental): `find_match` scans the
/// *other* entries in join order and returns the first whose score lies
/// in `[0.95 × caller, 1.05 × caller]`. The window is asymmetric by
/// construction — it is computed from the caller's score only.
pub struct MatchQueue {
    entries: HashMap<PlayerId, QueueEntry>,
    next_seq: u64,
}

impl MatchQueue {
    /// Half-width of the score window, as a fraction of the caller's score.
    pub const SCORE_WINDOW: f64 = 0.05;

    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Adds the player to the queue, or updates their entry in place if
    /// they are already waiting. Returns the score they are queued with.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        deck: DeckSummary,
        sender: QueueSender,
    ) -> i32 {
        let score = deck.score;
        match self.entries.get_mut(&player_id) {
            Some(entry) => {
                // Re-submit while waiting: new deck, new score, fresh
                // connection slot, original place in line.
                entry.deck = deck;
                entry.sender = sender;
                tracing::debug!(%player_id, score, "queue entry updated");
            }
            None => {
                let joined = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(
                    player_id,
                    QueueEntry {
                        player_id,
                        deck,
                        sender,
                        joined,
                    },
                );
                tracing::info!(%player_id, score, "player joined queue");
            }
        }
        score
    }

    /// Removes the player's entry if present. Never fails; leaving a
    /// queue you're not in is a no-op.
    pub fn leave(&mut self, player_id: PlayerId) -> bool {
        let removed = self.entries.remove(&player_id).is_some();
        if removed {
            tracing::info!(%player_id, "player left queue");
        }
        removed
    }

    /// Finds an opponent for `player_id` at the given score.
    ///
    /// Returns the first *other* waiting player (in join order) whose
    /// score lies within the ±5% window around `score`, or `None` — which
    /// is not an error, just "keep waiting".
    pub fn find_match(
        &self,
        player_id: PlayerId,
        score: i32,
    ) -> Option<PlayerId> {
        let lo = f64::from(score) * (1.0 - Self::SCORE_WINDOW);
        let hi = f64::from(score) * (1.0 + Self::SCORE_WINDOW);
        self.entries
            .values()
            .filter(|e| e.player_id != player_id)
            .filter(|e| {
                let s = f64::from(e.score());
                lo <= s && s <= hi
            })
            .min_by_key(|e| e.joined)
            .map(|e| e.player_id)
    }

    /// Removes both players' entries in one call and returns them.
    ///
    /// This is the claim step of matchmaking: the caller holds the queue
    /// lock across `find_match` + `take_pair`, so no third player can
    /// match either entry in between. Returns `None` if either entry is
    /// gone (e.g. the candidate disconnected first) — in that case any
    /// entry already removed is NOT restored, so callers must take the
    /// pair before doing anything irreversible.
    pub fn take_pair(
        &mut self,
        a: PlayerId,
        b: PlayerId,
    ) -> Option<(QueueEntry, QueueEntry)> {
        let entry_a = self.entries.remove(&a)?;
        match self.entries.remove(&b) {
            Some(entry_b) => Some((entry_a, entry_b)),
            None => {
                self.entries.insert(a, entry_a);
                None
            }
        }
    }

    /// Whether the player is currently waiting.
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.entries.contains_key(&player_id)
    }

    /// Number of waiting players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::DeckId;

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn deck(id: u64, score: i32) -> DeckSummary {
        DeckSummary {
            id: DeckId(id),
            score,
            units: Vec::new(),
        }
    }

    fn sender() -> QueueSender {
        mpsc::unbounded_channel().0
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_new_player_returns_score() {
        let mut q = MatchQueue::new();
        let score = q.join(pid(1), deck(10, 100), sender());
        assert_eq!(score, 100);
        assert_eq!(q.len(), 1);
        assert!(q.contains(pid(1)));
    }

    #[test]
    fn test_join_twice_updates_in_place() {
        // Re-joining while waiting must replace, never duplicate.
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());
        let score = q.join(pid(1), deck(11, 250), sender());

        assert_eq!(score, 250);
        assert_eq!(q.len(), 1, "upsert must not duplicate the entry");
    }

    #[test]
    fn test_join_upsert_keeps_place_in_line() {
        // Player 1 joins first, then refreshes their deck. They should
        // still be matched ahead of player 2.
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());
        q.join(pid(2), deck(20, 100), sender());
        q.join(pid(1), deck(11, 100), sender());

        assert_eq!(q.find_match(pid(3), 100), Some(pid(1)));
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_removes_entry() {
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());

        assert!(q.leave(pid(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn test_leave_unknown_player_is_noop() {
        let mut q = MatchQueue::new();
        assert!(!q.leave(pid(99)));
    }

    // =====================================================================
    // find_match()
    // =====================================================================

    #[test]
    fn test_find_match_within_window() {
        // 103 is inside [95, 105] — the window around 100.
        let mut q = MatchQueue::new();
        q.join(pid(2), deck(20, 103), sender());

        assert_eq!(q.find_match(pid(1), 100), Some(pid(2)));
    }

    #[test]
    fn test_find_match_outside_window_returns_none() {
        let mut q = MatchQueue::new();
        q.join(pid(2), deck(20, 106), sender());

        assert_eq!(q.find_match(pid(1), 100), None);
    }

    #[test]
    fn test_find_match_window_bounds_are_inclusive() {
        let mut q = MatchQueue::new();
        q.join(pid(2), deck(20, 95), sender());
        q.join(pid(3), deck(30, 105), sender());

        // Both bounds admit.
        assert!(q.find_match(pid(1), 100).is_some());
        q.leave(pid(2));
        assert_eq!(q.find_match(pid(1), 100), Some(pid(3)));
    }

    #[test]
    fn test_find_match_window_is_asymmetric() {
        // The window is computed from the CALLER's score only: a caller
        // at 100 admits a 95 (window [95, 105]), but a caller at 95 does
        // not admit a 100 (window [90.25, 99.75]).
        let mut q = MatchQueue::new();
        q.join(pid(2), deck(20, 95), sender());
        assert_eq!(q.find_match(pid(1), 100), Some(pid(2)));

        q.leave(pid(2));
        q.join(pid(3), deck(30, 100), sender());
        assert_eq!(q.find_match(pid(1), 95), None);
    }

    #[test]
    fn test_find_match_never_matches_self() {
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());

        assert_eq!(q.find_match(pid(1), 100), None);
    }

    #[test]
    fn test_find_match_prefers_earliest_joiner() {
        // Documented policy: first fit in join order.
        let mut q = MatchQueue::new();
        q.join(pid(2), deck(20, 101), sender());
        q.join(pid(3), deck(30, 99), sender());

        assert_eq!(q.find_match(pid(1), 100), Some(pid(2)));
    }

    #[test]
    fn test_find_match_empty_queue_returns_none() {
        let q = MatchQueue::new();
        assert_eq!(q.find_match(pid(1), 100), None);
    }

    // =====================================================================
    // take_pair()
    // =====================================================================

    #[test]
    fn test_take_pair_removes_both_entries() {
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());
        q.join(pid(2), deck(20, 103), sender());

        let (a, b) = q.take_pair(pid(1), pid(2)).expect("both present");
        assert_eq!(a.player_id, pid(1));
        assert_eq!(b.player_id, pid(2));
        assert!(q.is_empty());
    }

    #[test]
    fn test_take_pair_candidate_gone_restores_caller() {
        // If the candidate vanished between find and take, the caller's
        // own entry must stay queued.
        let mut q = MatchQueue::new();
        q.join(pid(1), deck(10, 100), sender());

        assert!(q.take_pair(pid(1), pid(2)).is_none());
        assert!(q.contains(pid(1)));
    }

    #[test]
    fn test_take_pair_carries_deck_and_sender() {
        let mut q = MatchQueue::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        q.join(pid(1), deck(10, 100), sender());
        q.join(pid(2), deck(20, 103), tx);

        let (_, theirs) = q.take_pair(pid(1), pid(2)).unwrap();
        assert_eq!(theirs.deck.id, DeckId(20));
        assert_eq!(theirs.score(), 103);

        // The sender still reaches the candidate's actor.
        theirs
            .sender
            .send(QueueEvent::Matched {
                room: RoomSlug::new("s".repeat(16)),
            })
            .unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(QueueEvent::Matched { .. })
        ));
    }
}
