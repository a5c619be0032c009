//! Game settings
//!
//! Supplied by the host as JSON; missing fields fall back to defaults. The
//! core only reads these, it never writes them back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::hazard::{DamageOnContact, DamagePolicy, NoDamage};
use crate::sim::level::ObstacleKind;
use crate::sim::player::PlayerTuning;

/// Settings load/validation failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// What touching a hazard costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DamageMode {
    /// Hazards only light up
    Off,
    /// Fixed `damage_per_hit` on every fresh contact
    #[default]
    OnContact,
}

impl DamageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageMode::Off => "off",
            DamageMode::OnContact => "on_contact",
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Course ===
    /// Obstacles between the start and end tiles
    pub blocks_count: u32,
    /// Types the generator draws from
    pub obstacle_catalog: Vec<ObstacleKind>,
    /// Delay between the first input and the clock starting (ms)
    pub lead_in_ms: f64,

    // === Health ===
    pub damage: DamageMode,
    pub damage_per_hit: f32,
    /// Restart the run when health hits zero
    pub restart_on_depletion: bool,

    // === Handling ===
    pub impulse_strength: f32,
    pub torque_strength: f32,
    /// Camera lerp rate (per second)
    pub camera_smoothing: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocks_count: DEFAULT_BLOCKS_COUNT,
            obstacle_catalog: ObstacleKind::ALL.to_vec(),
            lead_in_ms: LEAD_IN_MS,

            damage: DamageMode::OnContact,
            damage_per_hit: DEFAULT_DAMAGE,
            restart_on_depletion: true,

            impulse_strength: IMPULSE_STRENGTH,
            torque_strength: TORQUE_STRENGTH,
            camera_smoothing: CAMERA_SMOOTHING,
        }
    }
}

impl Settings {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse if given, falling back to defaults on any error
    pub fn load_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::from_json(json) {
            Ok(settings) => {
                log::info!("Loaded settings ({} blocks)", settings.blocks_count);
                settings
            }
            Err(err) => {
                log::warn!("{}; using default settings", err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.blocks_count > MAX_BLOCKS_COUNT {
            return Err(SettingsError::invalid(
                "blocks_count",
                format!("{} exceeds {}", self.blocks_count, MAX_BLOCKS_COUNT),
            ));
        }
        if !self.lead_in_ms.is_finite() || self.lead_in_ms < 0.0 {
            return Err(SettingsError::invalid(
                "lead_in_ms",
                "must be a non-negative number",
            ));
        }
        if !self.damage_per_hit.is_finite() || !(0.0..=MAX_HEALTH).contains(&self.damage_per_hit) {
            return Err(SettingsError::invalid(
                "damage_per_hit",
                format!("must be within 0..={}", MAX_HEALTH),
            ));
        }
        for (field, value) in [
            ("impulse_strength", self.impulse_strength),
            ("torque_strength", self.torque_strength),
            ("camera_smoothing", self.camera_smoothing),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }

    /// Damage policy for the hazard tracker
    pub fn damage_policy(&self) -> Box<dyn DamagePolicy> {
        match self.damage {
            DamageMode::Off => Box::new(NoDamage),
            DamageMode::OnContact => Box::new(DamageOnContact {
                amount: self.damage_per_hit,
            }),
        }
    }

    pub fn player_tuning(&self) -> PlayerTuning {
        PlayerTuning {
            impulse_strength: self.impulse_strength,
            torque_strength: self.torque_strength,
            camera_smoothing: self.camera_smoothing,
        }
    }
}
