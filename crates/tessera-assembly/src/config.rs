//! Board settings.

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, Result};
use crate::layers::{CollisionLayers, ATTACH_POINT_LAYER, PIECE_LAYER};

/// Attachment detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Radius of the proximity query around each attach point (world units).
    pub search_radius: f64,
    /// Maximum candidates considered per query.
    pub max_candidates: usize,
    /// Two sockets dock only if the dot product of their up directions is
    /// below this value.
    pub opposition_threshold: f64,
    /// Radius of the collider the built-in scan gives each attach point.
    pub collider_radius: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            search_radius: 0.05,
            max_candidates: 5,
            opposition_threshold: -0.95,
            collider_radius: 0.01,
        }
    }
}

/// Interactive rotation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// How far (degrees) a gesture may end from a symmetry multiple and
    /// still commit.
    pub snap_tolerance: f64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 10.0,
        }
    }
}

/// Everything a [`Board`](crate::Board) is configured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Attachment detector parameters.
    pub detector: DetectorSettings,
    /// Interactive rotation parameters.
    pub rotation: RotationSettings,
    /// Collision layer names, by index.
    pub layers: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            rotation: RotationSettings::default(),
            layers: vec![
                "Default".to_string(),
                PIECE_LAYER.to_string(),
                ATTACH_POINT_LAYER.to_string(),
            ],
        }
    }
}

impl BoardSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if !(d.search_radius > 0.0) {
            return Err(AssemblyError::InvalidSettings(
                "search_radius must be positive".into(),
            ));
        }
        if d.max_candidates == 0 {
            return Err(AssemblyError::InvalidSettings(
                "max_candidates must be at least 1".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&d.opposition_threshold) {
            return Err(AssemblyError::InvalidSettings(
                "opposition_threshold must lie in [-1, 1]".into(),
            ));
        }
        if !(d.collider_radius >= 0.0) {
            return Err(AssemblyError::InvalidSettings(
                "collider_radius must not be negative".into(),
            ));
        }
        if !(self.rotation.snap_tolerance >= 0.0) {
            return Err(AssemblyError::InvalidSettings(
                "snap_tolerance must not be negative".into(),
            ));
        }
        CollisionLayers::new(self.layers.clone())?;
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
