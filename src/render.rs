//! Render snapshot
//!
//! Flat Pod buffers the host's renderer uploads as-is. The layouts are shared
//! with JS, so field order and padding matter.

use bytemuck::{Pod, Zeroable};

use crate::sim::{GamePhase, GameState, ObstacleKind, SegmentKind};

// ============================================================================
// SHARED LAYOUTS
// ============================================================================

/// Per-frame values (48 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameGlobals {
    pub camera_position: [f32; 3], // offset 0
    pub health: f32,               // offset 12
    pub camera_target: [f32; 3],   // offset 16
    pub phase: u32,                // offset 28 - 0 ready, 1 playing, 2 ended
    pub time: f32,                 // offset 32 - obstacle clock (s)
    pub elapsed_ms: f32,           // offset 36 - timer, valid when has_timer
    pub has_timer: u32,            // offset 40
    pub part_count: u32,           // offset 44
}

/// One course tile (16 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SegmentInstance {
    pub position: [f32; 3],
    pub kind: u32, // 0 start, 1 obstacle, 2 end
}

/// One kinematic obstacle body (48 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PartInstance {
    pub translation: [f32; 3], // offset 0
    pub kind: u32,             // offset 12
    pub rotation: [f32; 4],    // offset 16 - quaternion xyzw
    pub obstacle: u32,         // offset 32
    pub part: u32,             // offset 36
    pub hit: u32,              // offset 40 - 1 while touching the player
    pub _pad: u32,
}

pub fn phase_code(phase: GamePhase) -> u32 {
    match phase {
        GamePhase::Ready => 0,
        GamePhase::Playing => 1,
        GamePhase::Ended => 2,
    }
}

pub fn kind_code(kind: ObstacleKind) -> u32 {
    match kind {
        ObstacleKind::Spinner => 0,
        ObstacleKind::Limbo => 1,
        ObstacleKind::Axe => 2,
        ObstacleKind::Stepper => 3,
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub globals: FrameGlobals,
    pub segments: Vec<SegmentInstance>,
    pub parts: Vec<PartInstance>,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState, now_ms: f64) -> Self {
        let segments = state
            .plan
            .segments()
            .iter()
            .map(|segment| SegmentInstance {
                position: segment.position.to_array(),
                kind: match segment.kind {
                    SegmentKind::Start => 0,
                    SegmentKind::Obstacle(_) => 1,
                    SegmentKind::End => 2,
                },
            })
            .collect();

        let parts: Vec<PartInstance> = state
            .obstacles
            .iter()
            .flat_map(|obstacle| {
                let hit = state.hazards.is_active(obstacle.id) as u32;
                let kind = kind_code(obstacle.kind());
                obstacle
                    .part_transforms(state.time_secs)
                    .into_iter()
                    .map(move |t| PartInstance {
                        translation: t.translation.to_array(),
                        kind,
                        rotation: t.rotation.to_array(),
                        obstacle: t.handle.obstacle.0,
                        part: t.handle.part as u32,
                        hit,
                        _pad: 0,
                    })
            })
            .collect();

        let session = state.store.snapshot();
        let elapsed = session.elapsed_ms(now_ms);
        let camera = state.player.camera;
        let globals = FrameGlobals {
            camera_position: camera.position.to_array(),
            health: session.health,
            camera_target: camera.target.to_array(),
            phase: phase_code(session.phase),
            time: state.time_secs as f32,
            elapsed_ms: elapsed.unwrap_or_default() as f32,
            has_timer: elapsed.is_some() as u32,
            part_count: parts.len() as u32,
        };

        Self {
            globals,
            segments,
            parts,
        }
    }

    pub fn globals_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.globals)
    }

    pub fn segment_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.segments)
    }

    pub fn part_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.parts)
    }
}
