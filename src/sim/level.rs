//! Level generation
//!
//! A course is Start + N obstacle segments + End, laid out along -z at a fixed
//! interval. Obstacle types are drawn from the level seed, independently per
//! slot (adjacent repeats are fine). The plan is never patched: a new
//! (count, seed) pair means a brand new plan.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::seed::RngState;
use crate::consts::*;
use crate::finish_line_z;

/// Obstacle types available to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Spinner,
    Limbo,
    Axe,
    Stepper,
}

impl ObstacleKind {
    /// Default catalog, in draw order
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Spinner,
        ObstacleKind::Limbo,
        ObstacleKind::Axe,
        ObstacleKind::Stepper,
    ];

    /// Number of kinematic bodies the obstacle drives
    pub fn part_count(&self) -> usize {
        match self {
            ObstacleKind::Stepper => 3,
            _ => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Spinner => "spinner",
            ObstacleKind::Limbo => "limbo",
            ObstacleKind::Axe => "axe",
            ObstacleKind::Stepper => "stepper",
        }
    }
}

/// What sits on a course segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Start,
    Obstacle(ObstacleKind),
    End,
}

/// One 4x4 floor tile of the course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub position: Vec3,
}

/// Obstacle type plus where it sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub kind: ObstacleKind,
    pub position: Vec3,
}

/// Axis-aligned box: centre and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Walls and floor around the whole course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Course length in segments (obstacles + start + end)
    pub length: u32,
}

impl Bounds {
    fn mid_z(&self) -> f32 {
        -(self.length as f32 * SEGMENT_LENGTH / 2.0) + SEGMENT_LENGTH / 2.0
    }

    pub fn right_wall(&self) -> Cuboid {
        Cuboid {
            center: Vec3::new(2.15, 0.75, self.mid_z()),
            half_extents: Vec3::new(0.15, 0.75, self.length as f32 * SEGMENT_LENGTH / 2.0),
        }
    }

    pub fn left_wall(&self) -> Cuboid {
        let mut wall = self.right_wall();
        wall.center.x = -wall.center.x;
        wall
    }

    pub fn back_wall(&self) -> Cuboid {
        Cuboid {
            center: Vec3::new(0.0, 0.75, -(self.length as f32 * SEGMENT_LENGTH) + SEGMENT_LENGTH / 2.0),
            half_extents: Vec3::new(2.3, 0.75, 0.15),
        }
    }

    /// Single floor collider under every segment
    pub fn floor(&self) -> Cuboid {
        Cuboid {
            center: Vec3::new(0.0, -0.1, self.mid_z()),
            half_extents: Vec3::new(SEGMENT_WIDTH / 2.0, 0.1, self.length as f32 * SEGMENT_LENGTH / 2.0),
        }
    }
}

/// Immutable obstacle layout for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPlan {
    blocks_count: u32,
    seed: u64,
    segments: Vec<Segment>,
}

impl LevelPlan {
    /// Build a plan of `blocks_count` obstacles drawn from `catalog` with `seed`
    pub fn generate(blocks_count: u32, seed: u64, catalog: &[ObstacleKind]) -> Self {
        let mut rng = RngState::new(seed).to_rng();
        let mut segments = Vec::with_capacity(blocks_count as usize + 2);

        segments.push(Segment {
            kind: SegmentKind::Start,
            position: Vec3::ZERO,
        });

        if !catalog.is_empty() {
            for i in 0..blocks_count {
                let kind = catalog[rng.random_range(0..catalog.len())];
                segments.push(Segment {
                    kind: SegmentKind::Obstacle(kind),
                    position: segment_position(i + 1),
                });
            }
        }

        let end_index = segments.len() as u32;
        segments.push(Segment {
            kind: SegmentKind::End,
            position: segment_position(end_index),
        });

        log::debug!(
            "Generated level: {} obstacles, seed {}",
            segments.len() - 2,
            seed
        );

        Self {
            blocks_count,
            seed,
            segments,
        }
    }

    pub fn blocks_count(&self) -> u32 {
        self.blocks_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True if this plan was generated from the given inputs
    pub fn matches(&self, blocks_count: u32, seed: u64) -> bool {
        self.blocks_count == blocks_count && self.seed == seed
    }

    /// All segments, Start first and End last
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Obstacle segments only, in course order
    pub fn obstacles(&self) -> impl Iterator<Item = ObstacleSpec> + '_ {
        self.segments.iter().filter_map(|s| match s.kind {
            SegmentKind::Obstacle(kind) => Some(ObstacleSpec {
                kind,
                position: s.position,
            }),
            _ => None,
        })
    }

    pub fn obstacle_kinds(&self) -> Vec<ObstacleKind> {
        self.obstacles().map(|o| o.kind).collect()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            length: self.blocks_count + 2,
        }
    }

    pub fn finish_line_z(&self) -> f32 {
        finish_line_z(self.blocks_count)
    }
}

fn segment_position(index: u32) -> Vec3 {
    Vec3::new(0.0, 0.0, -(index as f32) * SEGMENT_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_segment_count_and_spacing() {
        let plan = LevelPlan::generate(5, 1234, &ObstacleKind::ALL);
        let segments = plan.segments();
        assert_eq!(segments.len(), 7);
        assert_eq!(segments[0].kind, SegmentKind::Start);
        assert_eq!(segments[6].kind, SegmentKind::End);
        for pair in segments.windows(2) {
            assert!((pair[0].position.z - pair[1].position.z - SEGMENT_LENGTH).abs() < 1e-6);
            assert_eq!(pair[0].position.x, 0.0);
        }
    }

    #[test]
    fn test_zero_count_still_has_start_and_end() {
        let plan = LevelPlan::generate(0, 99, &ObstacleKind::ALL);
        assert_eq!(plan.segments().len(), 2);
        assert_eq!(plan.obstacles().count(), 0);
        assert_eq!(plan.segments()[1].position.z, -SEGMENT_LENGTH);
    }

    #[test]
    fn test_empty_catalog_yields_no_obstacles() {
        let plan = LevelPlan::generate(4, 1, &[]);
        assert_eq!(plan.segments().len(), 2);
    }

    #[test]
    fn test_single_kind_catalog() {
        let plan = LevelPlan::generate(6, 5, &[ObstacleKind::Axe]);
        assert!(plan.obstacle_kinds().iter().all(|k| *k == ObstacleKind::Axe));
    }

    #[test]
    fn test_bounds_geometry() {
        let plan = LevelPlan::generate(3, 0, &ObstacleKind::ALL);
        let bounds = plan.bounds();
        assert_eq!(bounds.length, 5);
        // Walls span from the start tile's near edge to the end tile's far edge
        let right = bounds.right_wall();
        assert!((right.center.z - -8.0).abs() < 1e-6);
        assert!((right.half_extents.z - 10.0).abs() < 1e-6);
        assert!((bounds.left_wall().center.x + 2.15).abs() < 1e-6);
        assert!((bounds.back_wall().center.z - -18.0).abs() < 1e-6);
        assert_eq!(plan.finish_line_z(), -14.0);
    }

    #[test]
    fn test_different_seeds_vary() {
        let a = LevelPlan::generate(20, 1, &ObstacleKind::ALL);
        let b = LevelPlan::generate(20, 2, &ObstacleKind::ALL);
        assert_ne!(a.obstacle_kinds(), b.obstacle_kinds());
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic(count in 0u32..40, seed in any::<u64>()) {
            let a = LevelPlan::generate(count, seed, &ObstacleKind::ALL);
            let b = LevelPlan::generate(count, seed, &ObstacleKind::ALL);
            prop_assert_eq!(a.obstacle_kinds(), b.obstacle_kinds());
            prop_assert_eq!(a.segments().len(), count as usize + 2);
            prop_assert!(a.matches(count, seed));
        }
    }
}
