//! Physics collaborator contract
//!
//! The core never integrates rigid bodies itself. The host's physics engine
//! implements this trait; the core reads the player's translation, pushes
//! impulses, and commands kinematic obstacle bodies.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable index of an obstacle within the current course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// One kinematic body belonging to an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KinematicHandle {
    pub obstacle: ObstacleId,
    /// Part index within the obstacle (Stepper has three)
    pub part: u8,
}

impl KinematicHandle {
    pub fn new(obstacle: ObstacleId, part: u8) -> Self {
        Self { obstacle, part }
    }
}

/// Result of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (unit) ray direction
    pub time_of_impact: f32,
}

/// Capabilities the core consumes from the physics engine
pub trait PhysicsWorld {
    /// Player body translation, `None` until the body exists
    fn player_translation(&self) -> Option<Vec3>;

    fn apply_player_impulse(&mut self, impulse: Vec3);

    fn apply_player_torque_impulse(&mut self, torque: Vec3);

    fn set_player_translation(&mut self, translation: Vec3);

    fn set_player_linvel(&mut self, linvel: Vec3);

    fn set_player_angvel(&mut self, angvel: Vec3);

    /// Cast a ray; `solid` means a ray starting inside a shape hits at 0
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_toi: f32, solid: bool) -> Option<RayHit>;

    fn set_next_kinematic_rotation(&mut self, body: KinematicHandle, rotation: Quat);

    fn set_next_kinematic_translation(&mut self, body: KinematicHandle, translation: Vec3);
}
