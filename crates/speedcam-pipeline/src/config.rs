//! Runtime configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "speed_threshold_kmh": 80.0, "solver": { "max_iters": 100 } }
//! ```

use crate::error::{Result, SpeedcamError};
use serde::{Deserialize, Serialize};
use speedcam_core::Real;
use speedcam_optim::PnpRefineOptions;
use std::path::Path;

/// A labelled distance along the road at which a reference line is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDistance {
    pub distance_m: Real,
    pub label: String,
}

impl ReferenceDistance {
    pub fn new(distance_m: Real, label: impl Into<String>) -> Self {
        Self {
            distance_m,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedcamConfig {
    /// Crossings strictly faster than this are reported.
    pub speed_threshold_kmh: Real,
    /// Road distance between the near and far lines, used for speed.
    pub real_distance_m: Real,
    pub reference_distances: Vec<ReferenceDistance>,
    pub near_label: String,
    pub far_label: String,
    /// Lateral world coordinate of the projected reference points.
    pub lateral_offset_m: Real,
    pub fallback_fps: Real,
    pub clip_padding_s: Real,
    /// Cap on concurrently tracked ids; `None` keeps every id.
    pub max_tracked_ids: Option<usize>,
    pub solver: PnpRefineOptions,
}

impl Default for SpeedcamConfig {
    fn default() -> Self {
        Self {
            speed_threshold_kmh: 60.0,
            real_distance_m: 20.0,
            reference_distances: vec![
                ReferenceDistance::new(20.0, "near"),
                ReferenceDistance::new(40.0, "far"),
            ],
            near_label: "near".to_string(),
            far_label: "far".to_string(),
            lateral_offset_m: 3.5,
            fallback_fps: 25.0,
            clip_padding_s: 0.5,
            max_tracked_ids: None,
            solver: PnpRefineOptions::default(),
        }
    }
}

impl SpeedcamConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SpeedcamError::io(path, e))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| SpeedcamError::format(Some(path), e.to_string()))?;
        config.validate().map_err(|reason| SpeedcamError::format(Some(path), reason))?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !(self.real_distance_m.is_finite() && self.real_distance_m > 0.0) {
            return Err(format!("real_distance_m must be positive, got {}", self.real_distance_m));
        }
        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(format!("fallback_fps must be positive, got {}", self.fallback_fps));
        }
        if !(self.clip_padding_s.is_finite() && self.clip_padding_s >= 0.0) {
            return Err(format!("clip_padding_s must be non-negative, got {}", self.clip_padding_s));
        }
        if self.max_tracked_ids == Some(0) {
            return Err("max_tracked_ids must be at least 1".to_string());
        }
        for label in [&self.near_label, &self.far_label] {
            if !self.reference_distances.iter().any(|d| &d.label == label) {
                return Err(format!("no reference distance labelled {label:?}"));
            }
        }
        Ok(())
    }
}
