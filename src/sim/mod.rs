//! Simulation module
//!
//! All gameplay logic lives here. It stays deterministic given its inputs:
//! - Time, controls and contacts are injected per tick
//! - Seeded RNG only
//! - Stable iteration order (by obstacle ID)
//! - No rendering or platform dependencies; physics is reached through a trait

pub mod hazard;
pub mod headless;
pub mod level;
pub mod obstacle;
pub mod physics;
pub mod player;
pub mod seed;
pub mod session;
pub mod tick;

pub use hazard::{
    ContactChange, ContactEvent, ContactKind, DamageOnContact, DamagePolicy, HazardTracker,
    NoDamage,
};
pub use headless::HeadlessWorld;
pub use level::{Bounds, Cuboid, LevelPlan, ObstacleKind, ObstacleSpec, Segment, SegmentKind};
pub use obstacle::{MotionParams, Obstacle, ObstaclePose, PartTransform, instantiate};
pub use physics::{KinematicHandle, ObstacleId, PhysicsWorld, RayHit};
pub use player::{
    CameraRig, Controls, InputTracker, PlayerController, PlayerTuning, below_fall_out,
    past_finish_line,
};
pub use seed::{RngState, SeedSource};
pub use session::{GamePhase, GameSession, SessionStore, SubscriptionId};
pub use tick::{GameEvent, GameState, TickInput, tick};
