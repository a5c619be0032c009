//! Gravity Dash - an obstacle-course runner core
//!
//! Core modules:
//! - `sim`: Game phases, level generation, obstacle motion, player control
//! - `render`: Plain-old-data snapshots for the external renderer
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Data-driven tuning, supplied by the host as JSON

pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;

pub use settings::{DamageMode, Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Largest frame delta fed into a tick (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Course layout
    pub const SEGMENT_LENGTH: f32 = 4.0;
    pub const SEGMENT_WIDTH: f32 = 4.0;
    pub const DEFAULT_BLOCKS_COUNT: u32 = 10;
    /// Upper bound on course length
    pub const MAX_BLOCKS_COUNT: u32 = 200;

    /// Session defaults
    pub const MAX_HEALTH: f32 = 10.0;
    pub const DEFAULT_DAMAGE: f32 = 0.5;
    /// Added to the start timestamp so the race timer counts down first
    pub const LEAD_IN_MS: f64 = 7000.0;

    /// Player body
    pub const PLAYER_RADIUS: f32 = 0.3;
    pub const PLAYER_SPAWN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const IMPULSE_STRENGTH: f32 = 1.0;
    pub const TORQUE_STRENGTH: f32 = 1.0;
    pub const JUMP_IMPULSE: f32 = 0.5;
    /// Ray origin sits just under the sphere surface
    pub const JUMP_RAY_DROP: f32 = 0.31;
    pub const JUMP_RAY_MAX: f32 = 10.0;
    pub const JUMP_GROUND_DISTANCE: f32 = 0.15;
    pub const FALL_OUT_Y: f32 = -4.0;

    /// Follow camera
    pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.65, 2.25);
    pub const CAMERA_TARGET_OFFSET: Vec3 = Vec3::new(0.0, 0.25, 0.0);
    pub const CAMERA_SMOOTHING: f32 = 5.0;
    pub const CAMERA_START: Vec3 = Vec3::new(10.0, 10.0, 10.0);
}

/// Longitudinal coordinate the player must reach to finish a course of `blocks_count` obstacles
#[inline]
pub fn finish_line_z(blocks_count: u32) -> f32 {
    -(blocks_count as f32 * consts::SEGMENT_LENGTH + 2.0)
}

/// Format a millisecond duration as seconds with two decimals ("12.34")
pub fn format_elapsed(elapsed_ms: f64) -> String {
    format!("{:.2}", elapsed_ms / 1000.0)
}
