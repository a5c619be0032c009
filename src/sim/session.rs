//! Game phase state machine
//!
//! `SessionStore` is the single owner of `GameSession`. Everything else reads
//! snapshots or subscribes; the only way to change the session is through the
//! named transitions below. Invalid transitions are silent no-ops.

use serde::{Deserialize, Serialize};

use super::seed::SeedSource;
use crate::consts::*;

/// Top-level lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Course laid out, waiting for the first input
    Ready,
    /// Timer running
    Playing,
    /// Finish line crossed, timer frozen
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Ready => "ready",
            GamePhase::Playing => "playing",
            GamePhase::Ended => "ended",
        }
    }
}

/// Session snapshot (timestamps in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub phase: GamePhase,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub health: f32,
    pub blocks_count: u32,
    pub blocks_seed: u64,
}

impl GameSession {
    pub fn new(blocks_count: u32, blocks_seed: u64) -> Self {
        Self {
            phase: GamePhase::Ready,
            start_time: None,
            end_time: None,
            health: MAX_HEALTH,
            blocks_count,
            blocks_seed,
        }
    }

    /// Timer reading: live while playing, frozen once ended, hidden when ready
    pub fn elapsed_ms(&self, now: f64) -> Option<f64> {
        match (self.phase, self.start_time, self.end_time) {
            (GamePhase::Playing, Some(start), _) => Some(now - start),
            (GamePhase::Ended, Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Plain number for hosts that can't hold Rust values
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

type Listener = Box<dyn FnMut(&GameSession, &GameSession)>;

struct Observer {
    id: SubscriptionId,
    /// Only fire when the phase changed
    phase_only: bool,
    listener: Listener,
}

/// Owner of the session; publishes every completed transition
pub struct SessionStore {
    session: GameSession,
    seeds: SeedSource,
    lead_in_ms: f64,
    observers: Vec<Observer>,
    next_subscription: u64,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.session)
            .field("lead_in_ms", &self.lead_in_ms)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SessionStore {
    /// Start in Ready with `blocks_seed` 0; later seeds come from `seeds`
    ///
    /// `blocks_count` is clamped to `MAX_BLOCKS_COUNT`.
    pub fn new(blocks_count: u32, seeds: SeedSource) -> Self {
        Self {
            session: GameSession::new(blocks_count.min(MAX_BLOCKS_COUNT), 0),
            seeds,
            lead_in_ms: LEAD_IN_MS,
            observers: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn with_lead_in(mut self, lead_in_ms: f64) -> Self {
        self.lead_in_ms = lead_in_ms;
        self
    }

    /// Current snapshot (copied)
    pub fn snapshot(&self) -> GameSession {
        self.session
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn health(&self) -> f32 {
        self.session.health
    }

    /// Motion stream for obstacle instantiation
    pub fn seeds_mut(&mut self) -> &mut SeedSource {
        &mut self.seeds
    }

    /// Ready -> Playing. Starts the clock `lead_in_ms` in the future.
    pub fn begin(&mut self, now: f64) -> bool {
        if self.session.phase != GamePhase::Ready {
            return false;
        }
        let mut next = self.session;
        next.phase = GamePhase::Playing;
        next.start_time = Some(now + self.lead_in_ms);
        next.health = MAX_HEALTH;
        self.commit(next)
    }

    /// Playing -> Ended. Freezes the clock.
    pub fn finish(&mut self, now: f64) -> bool {
        if self.session.phase != GamePhase::Playing {
            return false;
        }
        let mut next = self.session;
        next.phase = GamePhase::Ended;
        next.end_time = Some(now);
        self.commit(next)
    }

    /// Playing/Ended (or any phase at zero health) -> Ready with a new seed
    pub fn restart(&mut self) -> bool {
        let allowed = matches!(self.session.phase, GamePhase::Playing | GamePhase::Ended)
            || self.session.is_depleted();
        if !allowed {
            return false;
        }
        let mut next = self.session;
        next.phase = GamePhase::Ready;
        next.blocks_seed = self.seeds.next_seed(self.session.blocks_seed);
        next.health = MAX_HEALTH;
        self.commit(next)
    }

    /// Clamp health at zero; never changes phase
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let mut next = self.session;
        next.health = (next.health - amount).max(0.0);
        self.commit(next)
    }

    /// Resize the course; only while Ready and up to `MAX_BLOCKS_COUNT`
    pub fn set_blocks_count(&mut self, blocks_count: u32) -> bool {
        if self.session.phase != GamePhase::Ready || blocks_count > MAX_BLOCKS_COUNT {
            return false;
        }
        let mut next = self.session;
        next.blocks_count = blocks_count;
        self.commit(next)
    }

    /// Observe every published snapshot as `(previous, current)`
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameSession, &GameSession) + 'static,
    {
        self.add_observer(false, Box::new(listener))
    }

    /// Observe phase changes only
    pub fn subscribe_phase<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(GamePhase, GamePhase) + 'static,
    {
        self.add_observer(
            true,
            Box::new(move |prev: &GameSession, next: &GameSession| listener(prev.phase, next.phase)),
        )
    }

    /// Remove one observer; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn add_observer(&mut self, phase_only: bool, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push(Observer {
            id,
            phase_only,
            listener,
        });
        id
    }

    /// Swap in the whole next snapshot, then notify
    fn commit(&mut self, next: GameSession) -> bool {
        if next == self.session {
            return false;
        }
        let previous = std::mem::replace(&mut self.session, next);
        if previous.phase != next.phase {
            log::info!(
                "Phase {} -> {}",
                previous.phase.as_str(),
                next.phase.as_str()
            );
        }
        for observer in &mut self.observers {
            if observer.phase_only && previous.phase == next.phase {
                continue;
            }
            (observer.listener)(&previous, &next);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> SessionStore {
        SessionStore::new(3, SeedSource::new(2024))
    }

    #[test]
    fn test_initial_session() {
        let s = store().snapshot();
        assert_eq!(s.phase, GamePhase::Ready);
        assert_eq!(s.health, MAX_HEALTH);
        assert_eq!(s.blocks_seed, 0);
        assert!(s.start_time.is_none());
        assert!(s.elapsed_ms(1000.0).is_none());
    }

    #[test]
    fn test_full_cycle_scenario() {
        let mut store = store();
        let seed_before = store.snapshot().blocks_seed;

        assert!(store.begin(1_000.0));
        let s = store.snapshot();
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.start_time, Some(8_000.0));
        assert_eq!(s.health, MAX_HEALTH);
        // Lead-in reads as a countdown
        assert_eq!(s.elapsed_ms(2_000.0), Some(-6_000.0));

        assert!(store.finish(20_000.0));
        let s = store.snapshot();
        assert_eq!(s.phase, GamePhase::Ended);
        assert_eq!(s.end_time, Some(20_000.0));
        assert_eq!(s.elapsed_ms(99_999.0), Some(12_000.0));

        assert!(store.restart());
        let s = store.snapshot();
        assert_eq!(s.phase, GamePhase::Ready);
        assert_eq!(s.health, MAX_HEALTH);
        assert_ne!(s.blocks_seed, seed_before);
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut store = store();
        let before = store.snapshot();
        assert!(!store.finish(5.0));
        assert!(!store.restart());
        assert_eq!(store.snapshot(), before);

        store.begin(0.0);
        let playing = store.snapshot();
        assert!(!store.begin(50.0));
        assert_eq!(store.snapshot(), playing);

        store.finish(10.0);
        let ended = store.snapshot();
        assert!(!store.finish(20.0));
        assert!(!store.begin(20.0));
        assert!(!store.set_blocks_count(9));
        assert_eq!(store.snapshot(), ended);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut store = store();
        store.begin(0.0);
        store.apply_damage(7.0);
        assert_eq!(store.health(), 3.0);
        store.apply_damage(20.0);
        assert_eq!(store.health(), 0.0);
        assert_eq!(store.phase(), GamePhase::Playing);
        assert!(!store.apply_damage(0.5));
        assert!(!store.apply_damage(-4.0));
        assert!(!store.apply_damage(f32::NAN));
        assert_eq!(store.health(), 0.0);
    }

    #[test]
    fn test_restart_at_zero_health_from_ready() {
        let mut store = store();
        store.apply_damage(DEFAULT_DAMAGE * 20.0);
        assert_eq!(store.phase(), GamePhase::Ready);
        assert!(store.snapshot().is_depleted());
        assert!(store.restart());
        assert_eq!(store.health(), MAX_HEALTH);
    }

    #[test]
    fn test_set_blocks_count_only_in_ready() {
        let mut store = store();
        assert!(store.set_blocks_count(8));
        assert_eq!(store.snapshot().blocks_count, 8);
        store.begin(0.0);
        assert!(!store.set_blocks_count(2));
        assert_eq!(store.snapshot().blocks_count, 8);
    }

    #[test]
    fn test_blocks_count_is_capped() {
        let mut store = store();
        assert!(!store.set_blocks_count(u32::MAX));
        assert!(!store.set_blocks_count(MAX_BLOCKS_COUNT + 1));
        assert_eq!(store.snapshot().blocks_count, 3);
        assert!(store.set_blocks_count(MAX_BLOCKS_COUNT));

        let store = SessionStore::new(u32::MAX, SeedSource::new(1));
        assert_eq!(store.snapshot().blocks_count, MAX_BLOCKS_COUNT);
    }

    #[test]
    fn test_observers_receive_snapshots_and_unsubscribe() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let phases = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let all = store.subscribe(move |_, next| sink.borrow_mut().push(next.health));
        let sink = phases.clone();
        let phase_id = store.subscribe_phase(move |from, to| sink.borrow_mut().push((from, to)));

        store.begin(0.0);
        store.apply_damage(1.0);
        assert_eq!(*seen.borrow(), vec![10.0, 9.0]);
        assert_eq!(*phases.borrow(), vec![(GamePhase::Ready, GamePhase::Playing)]);

        assert!(store.unsubscribe(all));
        assert!(!store.unsubscribe(all));
        store.finish(1.0);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(phases.borrow().len(), 2);
        assert_eq!(store.observer_count(), 1);
        assert!(store.unsubscribe(phase_id));
    }

    #[test]
    fn test_lead_in_override() {
        let mut store = store().with_lead_in(0.0);
        store.begin(500.0);
        assert_eq!(store.snapshot().start_time, Some(500.0));
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Begin,
        Finish,
        Restart,
        Damage(f32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Begin),
            Just(Op::Finish),
            Just(Op::Restart),
            (0.0f32..12.0).prop_map(Op::Damage),
        ]
    }

    proptest! {
        #[test]
        fn prop_phase_order_is_respected(ops in prop::collection::vec(op(), 0..64)) {
            let mut store = SessionStore::new(4, SeedSource::new(1));
            for (i, op) in ops.into_iter().enumerate() {
                let now = i as f64 * 100.0;
                let before = store.snapshot();
                let changed = match op {
                    Op::Begin => store.begin(now),
                    Op::Finish => store.finish(now),
                    Op::Restart => store.restart(),
                    Op::Damage(amount) => store.apply_damage(amount),
                };
                let after = store.snapshot();
                if !changed {
                    prop_assert_eq!(before, after);
                }
                let legal = match (before.phase, after.phase) {
                    (a, b) if a == b => true,
                    (GamePhase::Ready, GamePhase::Playing) => true,
                    (GamePhase::Playing, GamePhase::Ended) => true,
                    (GamePhase::Playing | GamePhase::Ended, GamePhase::Ready) => true,
                    _ => false,
                };
                prop_assert!(legal, "{:?} -> {:?}", before.phase, after.phase);
                prop_assert!(after.health >= 0.0 && after.health <= MAX_HEALTH);
                if after.blocks_seed != before.blocks_seed {
                    prop_assert_eq!(after.phase, GamePhase::Ready);
                }
            }
        }
    }
}
