//! Player controller
//!
//! Turns directional intent into impulse + torque on the physics body, keeps a
//! smoothed follow camera, and watches the two course boundaries: the finish
//! line and the fall-out floor.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::physics::PhysicsWorld;
use super::session::SessionStore;
use crate::consts::*;
use crate::finish_line_z;

/// Abstract intent signals from the input collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
    pub leftward: bool,
    pub rightward: bool,
    pub jump: bool,
}

/// Edges derived from two consecutive control snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEdges {
    /// Any control pressed or released
    pub activity: bool,
    /// Jump went from released to pressed
    pub jump_pressed: bool,
}

/// Remembers the previous snapshot to produce edges
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    previous: Controls,
}

impl InputTracker {
    pub fn update(&mut self, current: Controls) -> InputEdges {
        let previous = std::mem::replace(&mut self.previous, current);
        InputEdges {
            activity: previous != current,
            jump_pressed: current.jump && !previous.jump,
        }
    }
}

/// Force scaling for one controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTuning {
    pub impulse_strength: f32,
    pub torque_strength: f32,
    pub camera_smoothing: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            impulse_strength: IMPULSE_STRENGTH,
            torque_strength: TORQUE_STRENGTH,
            camera_smoothing: CAMERA_SMOOTHING,
        }
    }
}

/// Impulse and torque for this tick's controls, scaled by `dt`
///
/// Each direction pushes along one horizontal axis and rolls the ball about
/// the perpendicular one. Simultaneous directions add up.
pub fn control_forces(controls: &Controls, tuning: &PlayerTuning, dt: f32) -> (Vec3, Vec3) {
    let impulse_strength = tuning.impulse_strength * dt;
    let torque_strength = tuning.torque_strength * dt;
    let mut impulse = Vec3::ZERO;
    let mut torque = Vec3::ZERO;

    if controls.forward {
        impulse.z -= impulse_strength;
        torque.x -= torque_strength;
    }
    if controls.rightward {
        impulse.x += impulse_strength;
        torque.z -= torque_strength;
    }
    if controls.backward {
        impulse.z += impulse_strength;
        torque.x += torque_strength;
    }
    if controls.leftward {
        impulse.x -= impulse_strength;
        torque.z += torque_strength;
    }

    (impulse, torque)
}

/// Smoothed camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: CAMERA_START,
            target: Vec3::ZERO,
        }
    }
}

impl CameraRig {
    pub fn desired_position(player: Vec3) -> Vec3 {
        player + CAMERA_OFFSET
    }

    pub fn desired_target(player: Vec3) -> Vec3 {
        player + CAMERA_TARGET_OFFSET
    }

    /// Exponential follow: move `smoothing * dt` of the way each tick
    pub fn follow(&mut self, player: Vec3, smoothing: f32, dt: f32) {
        let alpha = smoothing * dt;
        self.position = self.position.lerp(Self::desired_position(player), alpha);
        self.target = self.target.lerp(Self::desired_target(player), alpha);
    }
}

/// At or past the finish line (inclusive)
pub fn past_finish_line(position: Vec3, blocks_count: u32) -> bool {
    position.z <= finish_line_z(blocks_count)
}

/// Below the fall-out floor (strict)
pub fn below_fall_out(position: Vec3) -> bool {
    position.y < FALL_OUT_Y
}

/// What a controller tick did to the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub finished: bool,
    pub fell_out: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    pub camera: CameraRig,
    pub tuning: PlayerTuning,
}

impl PlayerController {
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            camera: CameraRig::default(),
            tuning,
        }
    }

    /// One simulation tick: push, follow, then check the boundaries
    pub fn tick<P: PhysicsWorld + ?Sized>(
        &mut self,
        controls: &Controls,
        dt: f32,
        physics: &mut P,
        store: &mut SessionStore,
        now: f64,
    ) -> StepOutcome {
        if physics.player_translation().is_none() {
            return StepOutcome::default();
        }

        let (impulse, torque) = control_forces(controls, &self.tuning, dt);
        physics.apply_player_impulse(impulse);
        physics.apply_player_torque_impulse(torque);

        let Some(position) = physics.player_translation() else {
            return StepOutcome::default();
        };
        self.camera.follow(position, self.tuning.camera_smoothing, dt);

        let blocks_count = store.snapshot().blocks_count;
        let mut outcome = StepOutcome::default();
        if past_finish_line(position, blocks_count) {
            outcome.finished = store.finish(now);
        }
        if below_fall_out(position) {
            outcome.fell_out = store.restart();
        }
        outcome
    }

    /// Jump if the ground is within reach; returns whether the impulse was applied
    pub fn try_jump<P: PhysicsWorld + ?Sized>(&self, physics: &mut P) -> bool {
        let Some(mut origin) = physics.player_translation() else {
            return false;
        };
        origin.y -= JUMP_RAY_DROP;

        let grounded = physics
            .cast_ray(origin, Vec3::NEG_Y, JUMP_RAY_MAX, true)
            .is_some_and(|hit| hit.time_of_impact < JUMP_GROUND_DISTANCE);
        if grounded {
            physics.apply_player_impulse(Vec3::new(0.0, JUMP_IMPULSE, 0.0));
        }
        grounded
    }

    /// Put the body back on the start tile with no residual motion
    pub fn reset<P: PhysicsWorld + ?Sized>(&self, physics: &mut P) {
        if physics.player_translation().is_none() {
            return;
        }
        physics.set_player_translation(PLAYER_SPAWN);
        physics.set_player_linvel(Vec3::ZERO);
        physics.set_player_angvel(Vec3::ZERO);
    }
}
