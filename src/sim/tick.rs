//! Per-frame simulation tick
//!
//! Drives the session, course, obstacles, hazards and player once per frame
//! from injected time, input and contact events. The physics engine steps
//! itself; this only talks to it through `PhysicsWorld`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use super::hazard::{ContactChange, ContactEvent, DamagePolicy, HazardTracker};
use super::level::{LevelPlan, ObstacleKind};
use super::obstacle::{Obstacle, instantiate};
use super::physics::PhysicsWorld;
use super::player::{Controls, InputTracker, PlayerController};
use super::seed::SeedSource;
use super::session::{GamePhase, SessionStore};
use crate::consts::*;
use crate::settings::Settings;

/// Everything the host hands over for one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held controls this frame
    pub controls: Controls,
    /// Host timestamp (ms)
    pub now_ms: f64,
    /// Collision enter/exit since the last frame
    pub contacts: Vec<ContactEvent>,
    /// Restart button
    pub restart_requested: bool,
}

/// Notable things that happened during a tick, for the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Host must recreate obstacle bodies and bounds
    CourseRebuilt { blocks_count: u32, seed: u64 },
    Jumped,
    Damaged { obstacle: u32, health: f32 },
    Finished { elapsed_ms: f64 },
    FellOut,
    HealthDepleted,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    pub store: SessionStore,
    pub plan: LevelPlan,
    pub obstacles: Vec<Obstacle>,
    pub hazards: HazardTracker,
    pub player: PlayerController,
    /// Obstacle animation clock (seconds since creation)
    pub time_secs: f64,
    damage: Box<dyn DamagePolicy>,
    input: InputTracker,
    catalog: Vec<ObstacleKind>,
    restart_on_depletion: bool,
    /// Phase transitions not yet published as events, in commit order
    phase_log: Rc<RefCell<Vec<(GamePhase, GamePhase)>>>,
}

impl GameState {
    /// Fresh Ready session; `entropy` seeds both the level seeds and obstacle motion
    pub fn new(entropy: u64, settings: &Settings) -> Self {
        let mut store = SessionStore::new(settings.blocks_count, SeedSource::new(entropy))
            .with_lead_in(settings.lead_in_ms);
        let session = store.snapshot();
        let plan = LevelPlan::generate(
            session.blocks_count,
            session.blocks_seed,
            &settings.obstacle_catalog,
        );
        let obstacles = instantiate(&plan, store.seeds_mut().motion_rng());
        let hazards = HazardTracker::new(&obstacles);

        let phase_log: Rc<RefCell<Vec<(GamePhase, GamePhase)>>> = Rc::default();
        let sink = Rc::clone(&phase_log);
        store.subscribe_phase(move |from, to| sink.borrow_mut().push((from, to)));

        Self {
            store,
            plan,
            obstacles,
            hazards,
            player: PlayerController::new(settings.player_tuning()),
            time_secs: 0.0,
            damage: settings.damage_policy(),
            input: InputTracker::default(),
            catalog: settings.obstacle_catalog.clone(),
            restart_on_depletion: settings.restart_on_depletion,
            phase_log,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.store.phase()
    }

    /// Timer reading in ms, if one should be shown
    pub fn elapsed_ms(&self, now_ms: f64) -> Option<f64> {
        self.store.snapshot().elapsed_ms(now_ms)
    }

    /// Change the course length; only honoured while Ready
    pub fn set_blocks_count(&mut self, blocks_count: u32) -> bool {
        self.store.set_blocks_count(blocks_count)
    }

    /// Replace the plan and obstacles when (count, seed) moved
    fn sync_course(&mut self, events: &mut Vec<GameEvent>) {
        let session = self.store.snapshot();
        if self.plan.matches(session.blocks_count, session.blocks_seed) {
            return;
        }
        self.plan = LevelPlan::generate(session.blocks_count, session.blocks_seed, &self.catalog);
        self.obstacles = instantiate(&self.plan, self.store.seeds_mut().motion_rng());
        self.hazards.reset(&self.obstacles);
        log::info!(
            "Course rebuilt: {} blocks, seed {}",
            session.blocks_count,
            session.blocks_seed
        );
        events.push(GameEvent::CourseRebuilt {
            blocks_count: session.blocks_count,
            seed: session.blocks_seed,
        });
    }

    /// Publish queued phase changes; entering Ready puts the player back on the start tile
    fn sync_phase<P: PhysicsWorld + ?Sized>(&mut self, physics: &mut P, events: &mut Vec<GameEvent>) {
        let changes = std::mem::take(&mut *self.phase_log.borrow_mut());
        for (from, to) in changes {
            events.push(GameEvent::PhaseChanged { from, to });
            if to == GamePhase::Ready {
                self.player.reset(physics);
                self.sync_course(events);
            }
        }
    }

    fn apply_contact(&mut self, event: ContactEvent, events: &mut Vec<GameEvent>) {
        let Some(ContactChange::Began(id)) = self.hazards.handle(event) else {
            return;
        };
        if self.store.phase() != GamePhase::Playing {
            return;
        }
        let Some(kind) = self.hazards.kind(id) else {
            return;
        };
        let amount = self.damage.damage_for(kind);
        if amount > 0.0 && self.store.apply_damage(amount) {
            log::debug!("Hit {} #{}: -{}", kind.as_str(), id.0, amount);
            events.push(GameEvent::Damaged {
                obstacle: id.0,
                health: self.store.health(),
            });
        }
    }
}

/// Advance the game by one frame
pub fn tick<P: PhysicsWorld + ?Sized>(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    physics: &mut P,
) -> Vec<GameEvent> {
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    let now = input.now_ms;
    let mut events = Vec::new();
    let course = (state.plan.blocks_count(), state.plan.seed());

    if input.restart_requested {
        state.store.restart();
        state.sync_phase(physics, &mut events);
    }

    // Input edges
    let edges = state.input.update(input.controls);
    if edges.activity {
        state.store.begin(now);
        state.sync_phase(physics, &mut events);
    }
    if edges.jump_pressed && state.player.try_jump(physics) {
        events.push(GameEvent::Jumped);
    }

    state.time_secs += f64::from(dt);
    state.sync_course(&mut events);

    for obstacle in &state.obstacles {
        obstacle.drive(state.time_secs, physics);
    }

    // Contacts from bodies of a course replaced this tick are stale
    if (state.plan.blocks_count(), state.plan.seed()) == course {
        for contact in &input.contacts {
            state.apply_contact(*contact, &mut events);
        }
    } else if !input.contacts.is_empty() {
        log::debug!("Dropped {} contacts from the old course", input.contacts.len());
    }

    let start_time = state.store.snapshot().start_time;
    let outcome = state
        .player
        .tick(&input.controls, dt, physics, &mut state.store, now);
    if outcome.finished {
        // A fall in the same tick may already have restarted the session
        let elapsed_ms = start_time.map_or(0.0, |start| now - start);
        log::info!("Finished in {}s", crate::format_elapsed(elapsed_ms));
        events.push(GameEvent::Finished { elapsed_ms });
    }
    if outcome.fell_out {
        events.push(GameEvent::FellOut);
    }

    if state.restart_on_depletion && state.store.snapshot().is_depleted() && state.store.restart() {
        log::info!("Health depleted, restarting");
        events.push(GameEvent::HealthDepleted);
    }

    state.sync_phase(physics, &mut events);
    events
}
