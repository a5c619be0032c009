//! Headless physics stand-in
//!
//! A point-mass sphere over a flat course floor. Good enough to drive the
//! native smoke run and the unit tests; the browser build uses the host's real
//! physics engine instead.

use std::collections::BTreeMap;
use std::f32::consts::PI;

use glam::{Quat, Vec3};

use super::level::{Bounds, Cuboid};
use super::physics::{KinematicHandle, PhysicsWorld, RayHit};
use crate::consts::*;

const GRAVITY: f32 = -9.81;
const LINEAR_DAMPING: f32 = 0.5;
const ANGULAR_DAMPING: f32 = 0.5;

/// Dynamic sphere state plus running totals of what the core pushed into it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBody {
    pub position: Vec3,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub total_impulse: Vec3,
    pub total_torque: Vec3,
}

impl SphereBody {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
            total_impulse: Vec3::ZERO,
            total_torque: Vec3::ZERO,
        }
    }

    /// Solid sphere, unit density
    pub fn mass() -> f32 {
        4.0 / 3.0 * PI * PLAYER_RADIUS.powi(3)
    }

    fn inertia() -> f32 {
        0.4 * Self::mass() * PLAYER_RADIUS * PLAYER_RADIUS
    }
}

/// Last commanded kinematic pose
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicTarget {
    pub rotation: Option<Quat>,
    pub translation: Option<Vec3>,
}

#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    pub player: SphereBody,
    player_present: bool,
    floor: Cuboid,
    kinematic: BTreeMap<(u32, u8), KinematicTarget>,
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWorld {
    /// Player at the spawn point over a default-length course
    pub fn new() -> Self {
        Self {
            player: SphereBody::at(PLAYER_SPAWN),
            player_present: true,
            floor: Bounds {
                length: DEFAULT_BLOCKS_COUNT + 2,
            }
            .floor(),
            kinematic: BTreeMap::new(),
        }
    }

    /// No player body yet, as before the host's first physics step
    pub fn without_player() -> Self {
        Self {
            player_present: false,
            ..Self::new()
        }
    }

    /// Rebuild static geometry for a new course
    pub fn set_course(&mut self, bounds: Bounds) {
        self.floor = bounds.floor();
        self.kinematic.clear();
    }

    pub fn kinematic_target(&self, body: KinematicHandle) -> Option<KinematicTarget> {
        self.kinematic.get(&(body.obstacle.0, body.part)).copied()
    }

    pub fn kinematic_count(&self) -> usize {
        self.kinematic.len()
    }

    fn floor_top(&self) -> f32 {
        self.floor.center.y + self.floor.half_extents.y
    }

    fn floor_bottom(&self) -> f32 {
        self.floor.center.y - self.floor.half_extents.y
    }

    fn over_floor(&self, point: Vec3) -> bool {
        let local = point - self.floor.center;
        local.x.abs() <= self.floor.half_extents.x && local.z.abs() <= self.floor.half_extents.z
    }

    /// Integrate one step: gravity, damping, floor contact
    pub fn step(&mut self, dt: f32) {
        if !self.player_present {
            return;
        }
        let top = self.floor_top();
        let over_floor = self.over_floor(self.player.position);
        let body = &mut self.player;

        body.linvel.y += GRAVITY * dt;
        body.linvel *= 1.0 / (1.0 + LINEAR_DAMPING * dt);
        body.angvel *= 1.0 / (1.0 + ANGULAR_DAMPING * dt);
        body.position += body.linvel * dt;

        // Only catch the ball if it was above the slab, never pull it back up
        let resting = top + PLAYER_RADIUS;
        if over_floor && body.position.y < resting && body.position.y > top - PLAYER_RADIUS {
            body.position.y = resting;
            if body.linvel.y < 0.0 {
                body.linvel.y = 0.0;
            }
        }
    }
}

impl PhysicsWorld for HeadlessWorld {
    fn player_translation(&self) -> Option<Vec3> {
        self.player_present.then_some(self.player.position)
    }

    fn apply_player_impulse(&mut self, impulse: Vec3) {
        self.player.total_impulse += impulse;
        self.player.linvel += impulse / SphereBody::mass();
    }

    fn apply_player_torque_impulse(&mut self, torque: Vec3) {
        self.player.total_torque += torque;
        self.player.angvel += torque / SphereBody::inertia();
    }

    fn set_player_translation(&mut self, translation: Vec3) {
        self.player.position = translation;
    }

    fn set_player_linvel(&mut self, linvel: Vec3) {
        self.player.linvel = linvel;
    }

    fn set_player_angvel(&mut self, angvel: Vec3) {
        self.player.angvel = angvel;
    }

    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_toi: f32, solid: bool) -> Option<RayHit> {
        if direction.y >= 0.0 || !self.over_floor(origin) {
            return None;
        }
        let top = self.floor_top();
        if origin.y <= top {
            return (solid && origin.y >= self.floor_bottom()).then_some(RayHit {
                time_of_impact: 0.0,
            });
        }
        let toi = (origin.y - top) / -direction.y;
        (toi <= max_toi).then_some(RayHit {
            time_of_impact: toi,
        })
    }

    fn set_next_kinematic_rotation(&mut self, body: KinematicHandle, rotation: Quat) {
        self.kinematic
            .entry((body.obstacle.0, body.part))
            .or_default()
            .rotation = Some(rotation);
    }

    fn set_next_kinematic_translation(&mut self, body: KinematicHandle, translation: Vec3) {
        self.kinematic
            .entry((body.obstacle.0, body.part))
            .or_default()
            .translation = Some(translation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_settles_on_floor() {
        let mut world = HeadlessWorld::new();
        for _ in 0..240 {
            world.step(1.0 / 120.0);
        }
        assert!((world.player.position.y - PLAYER_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_ball_falls_off_the_side() {
        let mut world = HeadlessWorld::new();
        world.player.position = Vec3::new(3.0, 1.0, -4.0);
        for _ in 0..240 {
            world.step(1.0 / 120.0);
        }
        assert!(world.player.position.y < FALL_OUT_Y);
    }

    #[test]
    fn test_ray_distance_to_floor() {
        let world = HeadlessWorld::new();
        let hit = world
            .cast_ray(Vec3::new(0.0, 0.5, -2.0), Vec3::NEG_Y, 10.0, true)
            .map(|h| h.time_of_impact);
        assert!(hit.is_some_and(|t| (t - 0.5).abs() < 1e-6));
        assert!(world.cast_ray(Vec3::new(0.0, 20.0, -2.0), Vec3::NEG_Y, 10.0, true).is_none());
        assert!(world.cast_ray(Vec3::new(5.0, 0.5, -2.0), Vec3::NEG_Y, 10.0, true).is_none());
    }
}
