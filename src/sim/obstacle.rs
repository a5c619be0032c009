//! Obstacle motion models
//!
//! Every obstacle is kinematic: its pose is a pure function of the clock and
//! a handful of parameters rolled once when the obstacle is built.

use std::f32::consts::{PI, TAU};
use std::f64::consts::TAU as TAU_F64;

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::level::{LevelPlan, ObstacleKind, ObstacleSpec};
use super::physics::{KinematicHandle, ObstacleId, PhysicsWorld};

/// Spinner bar rests just above the floor
pub const SPINNER_REST: Vec3 = Vec3::new(0.0, 0.3, 0.0);
/// Axe pivot height
pub const AXE_PIVOT: Vec3 = Vec3::new(0.0, 1.5, 0.0);
/// Peak axe swing (radians)
pub const AXE_AMPLITUDE: f32 = PI * 0.35;
/// Lateral spacing between stepper platforms
pub const STEPPER_SPACING: f32 = 1.2;

/// Rhythm of a single stepper platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMotion {
    pub speed: f32,
    pub offset: f32,
    /// Visual height of the platform box
    pub height: f32,
}

/// Per-instance motion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionParams {
    /// Signed yaw rate, |speed| in [0.2, 1.2)
    Spinner { speed: f32 },
    Limbo { offset: f32 },
    Axe { speed: f32, offset: f32 },
    Stepper { steps: [StepMotion; 3] },
}

impl MotionParams {
    /// Roll parameters for a freshly placed obstacle
    pub fn roll<R: Rng>(kind: ObstacleKind, rng: &mut R) -> Self {
        match kind {
            ObstacleKind::Spinner => {
                let magnitude = rng.random::<f32>() + 0.2;
                let sign = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
                MotionParams::Spinner {
                    speed: magnitude * sign,
                }
            }
            ObstacleKind::Limbo => MotionParams::Limbo {
                offset: rng.random::<f32>() * TAU,
            },
            ObstacleKind::Axe => MotionParams::Axe {
                speed: rng.random::<f32>() * 0.5 + 1.75,
                offset: rng.random::<f32>() * TAU,
            },
            ObstacleKind::Stepper => MotionParams::Stepper {
                steps: std::array::from_fn(|_| StepMotion {
                    speed: rng.random::<f32>() * 0.6 + 2.0,
                    offset: rng.random::<f32>() * TAU,
                    height: 0.2 + rng.random::<f32>() * 0.4,
                }),
            },
        }
    }

    pub fn kind(&self) -> ObstacleKind {
        match self {
            MotionParams::Spinner { .. } => ObstacleKind::Spinner,
            MotionParams::Limbo { .. } => ObstacleKind::Limbo,
            MotionParams::Axe { .. } => ObstacleKind::Axe,
            MotionParams::Stepper { .. } => ObstacleKind::Stepper,
        }
    }
}

/// Spinner yaw at time `t`, wrapped to one turn
#[inline]
pub fn spinner_angle(speed: f32, t: f64) -> f32 {
    (f64::from(speed) * t).rem_euclid(TAU_F64) as f32
}

/// Limbo bar height above the segment at time `t`
#[inline]
pub fn limbo_height(offset: f32, t: f64) -> f32 {
    (t + f64::from(offset)).sin() as f32 + 1.15
}

/// Axe roll at time `t`
#[inline]
pub fn axe_angle(speed: f32, offset: f32, t: f64) -> f32 {
    (t * f64::from(speed) + f64::from(offset)).sin() as f32 * AXE_AMPLITUDE
}

/// Stepper platform height above the segment at time `t`
#[inline]
pub fn step_height(step: &StepMotion, t: f64) -> f32 {
    (t * f64::from(step.speed) + f64::from(step.offset)).sin() as f32 * 0.5 + 0.4
}

/// Commanded kinematic targets for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstaclePose {
    Spinner { rotation: Quat },
    Limbo { translation: Vec3 },
    Axe { rotation: Quat },
    Stepper { translations: [Vec3; 3] },
}

/// Full world transform of one kinematic part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartTransform {
    pub handle: KinematicHandle,
    pub translation: Vec3,
    pub rotation: Quat,
}

/// A placed obstacle with its fixed motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: Vec3,
    pub motion: MotionParams,
}

impl Obstacle {
    pub fn new<R: Rng>(id: ObstacleId, spec: ObstacleSpec, rng: &mut R) -> Self {
        Self {
            id,
            position: spec.position,
            motion: MotionParams::roll(spec.kind, rng),
        }
    }

    pub fn kind(&self) -> ObstacleKind {
        self.motion.kind()
    }

    pub fn handle(&self, part: u8) -> KinematicHandle {
        KinematicHandle::new(self.id, part)
    }

    /// Kinematic targets at clock time `t` (seconds)
    pub fn pose(&self, t: f64) -> ObstaclePose {
        match self.motion {
            MotionParams::Spinner { speed } => ObstaclePose::Spinner {
                rotation: Quat::from_rotation_y(spinner_angle(speed, t)),
            },
            MotionParams::Limbo { offset } => ObstaclePose::Limbo {
                translation: self.position + Vec3::Y * limbo_height(offset, t),
            },
            MotionParams::Axe { speed, offset } => ObstaclePose::Axe {
                rotation: Quat::from_rotation_z(axe_angle(speed, offset, t)),
            },
            MotionParams::Stepper { steps } => ObstaclePose::Stepper {
                translations: std::array::from_fn(|i| {
                    self.position
                        + Vec3::new(
                            (i as f32 - 1.0) * STEPPER_SPACING,
                            step_height(&steps[i], t),
                            0.0,
                        )
                }),
            },
        }
    }

    /// Forward this tick's pose to the physics engine
    pub fn drive<P: PhysicsWorld + ?Sized>(&self, t: f64, physics: &mut P) {
        match self.pose(t) {
            ObstaclePose::Spinner { rotation } | ObstaclePose::Axe { rotation } => {
                physics.set_next_kinematic_rotation(self.handle(0), rotation);
            }
            ObstaclePose::Limbo { translation } => {
                physics.set_next_kinematic_translation(self.handle(0), translation);
            }
            ObstaclePose::Stepper { translations } => {
                for (part, translation) in translations.into_iter().enumerate() {
                    physics.set_next_kinematic_translation(self.handle(part as u8), translation);
                }
            }
        }
    }

    /// World transforms of every part, for rendering
    pub fn part_transforms(&self, t: f64) -> Vec<PartTransform> {
        match self.pose(t) {
            ObstaclePose::Spinner { rotation } => vec![PartTransform {
                handle: self.handle(0),
                translation: self.position + SPINNER_REST,
                rotation,
            }],
            ObstaclePose::Axe { rotation } => vec![PartTransform {
                handle: self.handle(0),
                translation: self.position + AXE_PIVOT,
                rotation,
            }],
            ObstaclePose::Limbo { translation } => vec![PartTransform {
                handle: self.handle(0),
                translation,
                rotation: Quat::IDENTITY,
            }],
            ObstaclePose::Stepper { translations } => translations
                .into_iter()
                .enumerate()
                .map(|(part, translation)| PartTransform {
                    handle: self.handle(part as u8),
                    translation,
                    rotation: Quat::IDENTITY,
                })
                .collect(),
        }
    }
}

/// Instantiate every obstacle of a plan, rolling motion from `rng`
pub fn instantiate<R: Rng>(plan: &LevelPlan, rng: &mut R) -> Vec<Obstacle> {
    plan.obstacles()
        .enumerate()
        .map(|(i, spec)| Obstacle::new(ObstacleId(i as u32), spec, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spec(kind: ObstacleKind) -> ObstacleSpec {
        ObstacleSpec {
            kind,
            position: Vec3::new(0.0, 0.0, -8.0),
        }
    }

    #[test]
    fn test_rolled_parameters_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..500 {
            match MotionParams::roll(ObstacleKind::Spinner, &mut rng) {
                MotionParams::Spinner { speed } => {
                    assert!(speed.abs() >= 0.2 && speed.abs() < 1.2, "speed {speed}")
                }
                other => panic!("unexpected {other:?}"),
            }
            match MotionParams::roll(ObstacleKind::Axe, &mut rng) {
                MotionParams::Axe { speed, offset } => {
                    assert!((1.75..2.25).contains(&speed));
                    assert!((0.0..TAU).contains(&offset));
                }
                other => panic!("unexpected {other:?}"),
            }
            match MotionParams::roll(ObstacleKind::Stepper, &mut rng) {
                MotionParams::Stepper { steps } => {
                    for step in steps {
                        assert!((2.0..2.6).contains(&step.speed));
                        assert!((0.2..0.6).contains(&step.height));
                    }
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_spinner_sign_varies() {
        let mut rng = Pcg32::seed_from_u64(11);
        let signs: Vec<bool> = (0..64)
            .map(|_| match MotionParams::roll(ObstacleKind::Spinner, &mut rng) {
                MotionParams::Spinner { speed } => speed > 0.0,
                _ => unreachable!(),
            })
            .collect();
        assert!(signs.iter().any(|s| *s));
        assert!(signs.iter().any(|s| !*s));
    }

    #[test]
    fn test_limbo_height_bounds() {
        let obstacle = Obstacle {
            id: ObstacleId(0),
            position: Vec3::new(0.0, 0.0, -4.0),
            motion: MotionParams::Limbo { offset: 0.0 },
        };
        for i in 0..200 {
            let t = i as f64 * 0.05;
            let ObstaclePose::Limbo { translation } = obstacle.pose(t) else {
                panic!("limbo pose expected");
            };
            assert!(translation.y >= 0.15 - 1e-5 && translation.y <= 2.15 + 1e-5);
            assert_eq!(translation.z, -4.0);
        }
        let ObstaclePose::Limbo { translation } = obstacle.pose(0.0) else {
            unreachable!()
        };
        assert!((translation.y - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_axe_swing_bounded() {
        for i in 0..400 {
            let angle = axe_angle(2.0, 1.0, i as f64 * 0.01);
            assert!(angle.abs() <= AXE_AMPLITUDE + 1e-6);
        }
        assert!((AXE_AMPLITUDE.to_degrees() - 63.0).abs() < 0.01);
    }

    #[test]
    fn test_spinner_rotation_is_yaw() {
        let obstacle = Obstacle {
            id: ObstacleId(1),
            position: Vec3::ZERO,
            motion: MotionParams::Spinner { speed: 0.5 },
        };
        let ObstaclePose::Spinner { rotation } = obstacle.pose(2.0) else {
            panic!("spinner pose expected");
        };
        let (axis, angle) = rotation.to_axis_angle();
        assert!((angle - 1.0).abs() < 1e-4);
        assert!((axis - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_motion_stays_smooth_after_hours() {
        let dt = 1.0 / 60.0;
        let t = 10.0 * 3600.0;
        let turn = (spinner_angle(1.0, t + dt) - spinner_angle(1.0, t)).rem_euclid(TAU);
        assert!((turn - dt as f32).abs() < 1e-4);

        let swing = axe_angle(2.0, 0.0, t + dt) - axe_angle(2.0, 0.0, t);
        assert!(swing.abs() <= 2.0 * dt as f32 * AXE_AMPLITUDE + 1e-4);
    }

    #[test]
    fn test_stepper_platforms_offset_laterally() {
        let mut rng = Pcg32::seed_from_u64(5);
        let obstacle = Obstacle::new(ObstacleId(2), spec(ObstacleKind::Stepper), &mut rng);
        let ObstaclePose::Stepper { translations } = obstacle.pose(1.3) else {
            panic!("stepper pose expected");
        };
        assert!((translations[0].x + 1.2).abs() < 1e-6);
        assert!(translations[1].x.abs() < 1e-6);
        assert!((translations[2].x - 1.2).abs() < 1e-6);
        for translation in translations {
            assert!(translation.y >= -0.1 - 1e-5 && translation.y <= 0.9 + 1e-5);
        }
        assert_eq!(obstacle.part_transforms(1.3).len(), 3);
    }

    #[test]
    fn test_pose_is_pure() {
        let mut rng = Pcg32::seed_from_u64(8);
        let obstacle = Obstacle::new(ObstacleId(0), spec(ObstacleKind::Axe), &mut rng);
        assert_eq!(obstacle.pose(3.25), obstacle.pose(3.25));
    }

    #[test]
    fn test_instantiate_assigns_ids_in_course_order() {
        let plan = LevelPlan::generate(6, 77, &ObstacleKind::ALL);
        let mut rng = Pcg32::seed_from_u64(1);
        let obstacles = instantiate(&plan, &mut rng);
        assert_eq!(obstacles.len(), 6);
        for (i, (obstacle, spec)) in obstacles.iter().zip(plan.obstacles()).enumerate() {
            assert_eq!(obstacle.id, ObstacleId(i as u32));
            assert_eq!(obstacle.kind(), spec.kind);
            assert_eq!(obstacle.position, spec.position);
        }
    }
}
