//! Hazard contact tracking
//!
//! Collision enter/exit events from the physics engine flip a per-part flag;
//! an obstacle is "hit" while any of its parts touches the player. What a hit
//! costs is up to the configured `DamagePolicy`.

use serde::{Deserialize, Serialize};

use super::level::ObstacleKind;
use super::obstacle::Obstacle;
use super::physics::{KinematicHandle, ObstacleId};

/// Most parts any obstacle has (Stepper)
pub const MAX_PARTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Started,
    Stopped,
}

/// Collision enter/exit between the player and one obstacle body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub body: KinematicHandle,
    pub kind: ContactKind,
}

impl ContactEvent {
    pub fn started(body: KinematicHandle) -> Self {
        Self {
            body,
            kind: ContactKind::Started,
        }
    }

    pub fn stopped(body: KinematicHandle) -> Self {
        Self {
            body,
            kind: ContactKind::Stopped,
        }
    }
}

/// Obstacle-level change caused by a contact event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactChange {
    Began(ObstacleId),
    Ended(ObstacleId),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    kind: ObstacleKind,
    parts: [bool; MAX_PARTS],
}

impl Slot {
    fn active(&self) -> bool {
        self.parts.iter().any(|p| *p)
    }
}

/// Per-obstacle "touching the player" state
#[derive(Debug, Clone, Default)]
pub struct HazardTracker {
    slots: Vec<Slot>,
}

impl HazardTracker {
    pub fn new(obstacles: &[Obstacle]) -> Self {
        let mut tracker = Self::default();
        tracker.reset(obstacles);
        tracker
    }

    /// Forget every contact and size for a new course
    pub fn reset(&mut self, obstacles: &[Obstacle]) {
        self.slots = obstacles
            .iter()
            .map(|o| Slot {
                kind: o.kind(),
                parts: [false; MAX_PARTS],
            })
            .collect();
    }

    /// Apply one event; returns the obstacle-level change, if any
    pub fn handle(&mut self, event: ContactEvent) -> Option<ContactChange> {
        let id = event.body.obstacle;
        let part = event.body.part as usize;
        let slot = self.slots.get_mut(id.0 as usize)?;
        if part >= slot.kind.part_count() {
            log::warn!("Contact on unknown part {} of obstacle {}", part, id.0);
            return None;
        }

        let was_active = slot.active();
        slot.parts[part] = event.kind == ContactKind::Started;
        match (was_active, slot.active()) {
            (false, true) => Some(ContactChange::Began(id)),
            (true, false) => Some(ContactChange::Ended(id)),
            _ => None,
        }
    }

    pub fn is_active(&self, id: ObstacleId) -> bool {
        self.slots.get(id.0 as usize).is_some_and(Slot::active)
    }

    /// Obstacle type for a tracked id
    pub fn kind(&self, id: ObstacleId) -> Option<ObstacleKind> {
        self.slots.get(id.0 as usize).map(|s| s.kind)
    }

    /// Contact flags in obstacle order
    pub fn flags(&self) -> impl Iterator<Item = bool> + '_ {
        self.slots.iter().map(Slot::active)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active()).count()
    }
}

/// Decides how much health a fresh hazard contact costs
pub trait DamagePolicy: std::fmt::Debug {
    fn damage_for(&mut self, kind: ObstacleKind) -> f32;
}

/// Hits only light up the obstacle
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDamage;

impl DamagePolicy for NoDamage {
    fn damage_for(&mut self, _kind: ObstacleKind) -> f32 {
        0.0
    }
}

/// Fixed cost per contact
#[derive(Debug, Clone, Copy)]
pub struct DamageOnContact {
    pub amount: f32,
}

impl DamagePolicy for DamageOnContact {
    fn damage_for(&mut self, _kind: ObstacleKind) -> f32 {
        self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::sim::obstacle::{MotionParams, StepMotion};

    fn obstacles() -> Vec<Obstacle> {
        let step = StepMotion {
            speed: 2.0,
            offset: 0.0,
            height: 0.4,
        };
        vec![
            Obstacle {
                id: ObstacleId(0),
                position: Vec3::new(0.0, 0.0, -4.0),
                motion: MotionParams::Spinner { speed: 1.0 },
            },
            Obstacle {
                id: ObstacleId(1),
                position: Vec3::new(0.0, 0.0, -8.0),
                motion: MotionParams::Stepper { steps: [step; 3] },
            },
        ]
    }

    fn body(obstacle: u32, part: u8) -> KinematicHandle {
        KinematicHandle::new(ObstacleId(obstacle), part)
    }

    #[test]
    fn test_enter_exit_toggles_flag() {
        let mut tracker = HazardTracker::new(&obstacles());
        assert!(!tracker.is_active(ObstacleId(0)));

        let change = tracker.handle(ContactEvent::started(body(0, 0)));
        assert_eq!(change, Some(ContactChange::Began(ObstacleId(0))));
        assert!(tracker.is_active(ObstacleId(0)));

        let change = tracker.handle(ContactEvent::stopped(body(0, 0)));
        assert_eq!(change, Some(ContactChange::Ended(ObstacleId(0))));
        assert!(!tracker.is_active(ObstacleId(0)));
    }

    #[test]
    fn test_duplicate_events_are_idempotent() {
        let mut tracker = HazardTracker::new(&obstacles());
        tracker.handle(ContactEvent::started(body(0, 0)));
        assert_eq!(tracker.handle(ContactEvent::started(body(0, 0))), None);
        tracker.handle(ContactEvent::stopped(body(0, 0)));
        assert_eq!(tracker.handle(ContactEvent::stopped(body(0, 0))), None);
        assert!(!tracker.is_active(ObstacleId(0)));
    }

    #[test]
    fn test_multi_part_stays_active_until_all_parts_leave() {
        let mut tracker = HazardTracker::new(&obstacles());
        tracker.handle(ContactEvent::started(body(1, 0)));
        assert_eq!(tracker.handle(ContactEvent::started(body(1, 2))), None);
        assert_eq!(tracker.handle(ContactEvent::stopped(body(1, 0))), None);
        assert!(tracker.is_active(ObstacleId(1)));
        assert_eq!(
            tracker.handle(ContactEvent::stopped(body(1, 2))),
            Some(ContactChange::Ended(ObstacleId(1)))
        );
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_unknown_bodies_ignored() {
        let mut tracker = HazardTracker::new(&obstacles());
        assert_eq!(tracker.handle(ContactEvent::started(body(9, 0))), None);
        // Spinner has a single part
        assert_eq!(tracker.handle(ContactEvent::started(body(0, 2))), None);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_reset_clears_flags() {
        let list = obstacles();
        let mut tracker = HazardTracker::new(&list);
        tracker.handle(ContactEvent::started(body(1, 1)));
        tracker.reset(&list);
        assert!(tracker.flags().all(|f| !f));
        assert_eq!(tracker.kind(ObstacleId(1)), Some(ObstacleKind::Stepper));
    }

    #[test]
    fn test_policies() {
        assert_eq!(NoDamage.damage_for(ObstacleKind::Axe), 0.0);
        let mut policy = DamageOnContact { amount: 0.5 };
        assert_eq!(policy.damage_for(ObstacleKind::Limbo), 0.5);
    }
}
