//! Registry of all live matches
//!
//! The map itself is a `DashMap` so creation and lookups from many requests
//! never contend on a single lock. Each match sits behind its own mutex; every
//! read or write of one match happens inside that lock, so operations on the
//! same match are serialized and a completed write is visible to the next read.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::interval;
use tracing::{debug, info};

use super::error::MatchError;
use super::r#match::{Match, MatchId, ParticipantId};
use super::snapshot::MatchSnapshot;
use super::Side;

type SharedMatch = Arc<Mutex<Match>>;

pub struct MatchRegistry {
    matches: DashMap<MatchId, SharedMatch>,
    /// Source of per-match seeds
    seeds: Mutex<ChaCha8Rng>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::with_seeds(ChaCha8Rng::from_entropy())
    }

    /// Deterministic seed sequence, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::with_seeds(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_seeds(seeds: ChaCha8Rng) -> Self {
        Self {
            matches: DashMap::new(),
            seeds: Mutex::new(seeds),
        }
    }

    /// Allocate a new match owned by `creator`
    pub fn create(&self, creator: ParticipantId) -> MatchId {
        let seed: u64 = self.seeds.lock().gen();
        loop {
            let id = MatchId::generate();
            if let Entry::Vacant(slot) = self.matches.entry(id.clone()) {
                info!(match_id = %id, creator = %creator, "Match created");
                slot.insert(Arc::new(Mutex::new(Match::new(id.clone(), creator, seed))));
                return id;
            }
        }
    }

    fn handle(&self, id: &MatchId) -> Result<SharedMatch, MatchError> {
        // Clone the Arc out so the shard lock is released before the match lock is taken.
        self.matches
            .get(id)
            .map(|m| m.value().clone())
            .ok_or_else(|| MatchError::NotFound(id.clone()))
    }

    /// Current state of a match. `viewer`, when given, must be a participant;
    /// a participant's read counts as activity for idle eviction.
    pub fn snapshot(
        &self,
        id: &MatchId,
        viewer: Option<&ParticipantId>,
    ) -> Result<MatchSnapshot, MatchError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock();
        let side = match viewer {
            Some(p) => {
                let side = state
                    .side_of(p)
                    .ok_or_else(|| MatchError::unauthorized("not a participant of this match"))?;
                state.keep_alive();
                Some(side)
            }
            None => None,
        };
        Ok(MatchSnapshot::build(&state, side))
    }

    /// Side of a participant, if they belong to the match
    pub fn side_of(
        &self,
        id: &MatchId,
        participant: &ParticipantId,
    ) -> Result<Option<Side>, MatchError> {
        let handle = self.handle(id)?;
        let state = handle.lock();
        Ok(state.side_of(participant))
    }

    /// Run `f` against the match under its lock. This is the only way state changes.
    pub fn mutate<R>(
        &self,
        id: &MatchId,
        f: impl FnOnce(&mut Match) -> Result<R, MatchError>,
    ) -> Result<R, MatchError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock();
        f(&mut state)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    /// Drop every match idle for longer than `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.matches.len();
        self.matches.retain(|_, m| m.lock().idle_for() <= max_idle);
        before.saturating_sub(self.matches.len())
    }

    /// Periodically evict idle matches. Runs until the task is dropped.
    pub async fn run_sweeper(self: Arc<Self>, max_idle: Duration, every: Duration) {
        info!(
            max_idle_secs = max_idle.as_secs(),
            every_secs = every.as_secs(),
            "Match sweeper started"
        );
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = self.evict_idle(max_idle);
            if evicted > 0 {
                info!(evicted, remaining = self.active_matches(), "Evicted idle matches");
            } else {
                debug!(remaining = self.active_matches(), "Sweep found nothing idle");
            }
        }
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::tests::{pid, squad};
    use crate::game::roster::CombatantClass;
    use crate::game::{ActionCommand, MatchPhase, ScriptedDice};
    use tokio_test::{assert_err, assert_ok};

    fn ready(registry: &MatchRegistry) -> MatchId {
        let id = registry.create(pid("alice"));
        assert_ok!(registry.mutate(&id, |m| m.join(pid("bob"))));
        let (a, b) = (
            squad("A", CombatantClass::Melee, 130),
            squad("B", CombatantClass::Melee, 130),
        );
        assert_ok!(registry.mutate(&id, |m| m.submit_team(&pid("alice"), &a)));
        assert_ok!(registry.mutate(&id, |m| m.submit_team(&pid("bob"), &b)));
        assert_ok!(registry.mutate(&id, |m| m.submit_map(&pid("alice"), "restaurant")));
        id
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let registry = MatchRegistry::seeded(1);
        let missing = MatchId::from("nope0000");
        assert_eq!(
            registry.snapshot(&missing, None).unwrap_err(),
            MatchError::NotFound(missing.clone())
        );
        assert_err!(registry.mutate(&missing, |m| m.join(pid("bob"))));
    }

    #[test]
    fn mutations_are_visible_to_the_next_read() {
        let registry = MatchRegistry::seeded(1);
        let id = ready(&registry);

        let snap = registry.snapshot(&id, Some(&pid("alice"))).unwrap();
        assert_eq!(snap.phase, MatchPhase::InProgress);
        assert_eq!(snap.viewer.map(|v| v.your_turn), Some(true));

        assert_err!(registry.snapshot(&id, Some(&pid("eve"))));
        assert_eq!(registry.side_of(&id, &pid("bob")), Ok(Some(Side::Opponent)));
    }

    #[test]
    fn rejected_action_leaves_snapshot_identical() {
        let registry = MatchRegistry::seeded(9);
        let id = ready(&registry);
        let before = registry.snapshot(&id, None).unwrap();

        let command = ActionCommand {
            combatant_index: 0,
            action_key: "1".to_string(),
            target_index: 0,
        };
        assert_err!(registry.mutate(&id, |m| m.submit_action(&pid("bob"), &command)));
        assert_eq!(registry.snapshot(&id, None).unwrap(), before);
    }

    #[test]
    fn concurrent_actions_serialize() {
        let registry = Arc::new(MatchRegistry::seeded(3));
        let id = ready(&registry);
        let command = ActionCommand {
            combatant_index: 0,
            action_key: "1".to_string(),
            target_index: 0,
        };

        // Both racers act as the creator; exactly one can win the turn.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let id = id.clone();
                let command = command.clone();
                std::thread::spawn(move || {
                    registry.mutate(&id, |m| {
                        m.submit_action_with(&pid("alice"), &command, &mut ScriptedDice::new([40]))
                    })
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .filter(Result::is_ok)
            .count();

        assert_eq!(wins, 1);
        let snap = registry.snapshot(&id, None).unwrap();
        assert_eq!(snap.turn_number, 2);
        assert_eq!(snap.creator.stats.damage_dealt, 40);
    }

    #[test]
    fn eviction_removes_only_idle_matches() {
        let registry = MatchRegistry::seeded(5);
        registry.create(pid("alice"));
        registry.create(pid("carol"));
        assert_eq!(registry.active_matches(), 2);

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.evict_idle(Duration::from_millis(1)), 2);
        assert_eq!(registry.active_matches(), 0);
    }

    #[test]
    fn participant_polls_keep_a_match_alive() {
        let registry = MatchRegistry::seeded(5);
        let id = registry.create(pid("alice"));
        let ttl = Duration::from_millis(40);

        std::thread::sleep(Duration::from_millis(60));
        let before = assert_ok!(registry.snapshot(&id, Some(&pid("alice"))));
        assert_eq!(registry.evict_idle(ttl), 0);

        // reads keep the match alive but are not state changes
        let after = assert_ok!(registry.snapshot(&id, None));
        assert_eq!(before.updated_at, after.updated_at);

        std::thread::sleep(Duration::from_millis(60));
        assert_ok!(registry.snapshot(&id, None));
        assert_err!(registry.snapshot(&id, Some(&pid("mallory"))));
        assert_eq!(registry.evict_idle(ttl), 1);
    }

    #[tokio::test]
    async fn sweeper_evicts_in_background() {
        let registry = Arc::new(MatchRegistry::seeded(5));
        registry.create(pid("alice"));
        let sweeper = tokio::spawn(
            registry
                .clone()
                .run_sweeper(Duration::from_millis(5), Duration::from_millis(10)),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(registry.active_matches(), 0);
        sweeper.abort();
    }
}
