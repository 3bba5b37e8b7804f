//! Projection of known-distance reference lines into the image.

use crate::calibration::Pose;
use crate::config::ReferenceDistance;
use crate::error::{Result, SpeedcamError};
use log::debug;
use serde::{Deserialize, Serialize};
use speedcam_core::{Pt3, Real};

/// Horizontal image line at a known road distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub label: String,
    pub real_distance_m: Real,
    /// Image row of the projected reference point, truncated toward zero.
    pub image_y: i32,
}

/// Projects world points `(distance, lateral_offset, 0)` through a pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionEngine {
    lateral_offset_m: Real,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(3.5)
    }
}

impl ProjectionEngine {
    pub fn new(lateral_offset_m: Real) -> Self {
        Self { lateral_offset_m }
    }

    pub fn lateral_offset_m(&self) -> Real {
        self.lateral_offset_m
    }

    pub fn project_line(&self, pose: &Pose, distance: &ReferenceDistance) -> Result<ReferenceLine> {
        let world = Pt3::new(distance.distance_m, self.lateral_offset_m, 0.0);
        let uv = pose.project_world_point(&world).ok_or_else(|| {
            SpeedcamError::Calibration(format!(
                "reference point {:?} at {} m is behind the camera",
                distance.label, distance.distance_m
            ))
        })?;
        if !uv.y.is_finite() {
            return Err(SpeedcamError::Calibration(format!(
                "reference point {:?} projects to a non-finite row",
                distance.label
            )));
        }
        let image_y = uv.y.trunc() as i32;
        debug!("reference line {:?}: y = {} ({:.3})", distance.label, image_y, uv.y);
        Ok(ReferenceLine {
            label: distance.label.clone(),
            real_distance_m: distance.distance_m,
            image_y,
        })
    }

    /// One line per reference distance, in input order.
    pub fn project_lines(&self, pose: &Pose, distances: &[ReferenceDistance]) -> Result<Vec<ReferenceLine>> {
        distances.iter().map(|d| self.project_line(pose, d)).collect()
    }
}

/// The two lines bounding the measurement zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLines {
    pub near: ReferenceLine,
    pub far: ReferenceLine,
}

impl ZoneLines {
    pub fn new(near: ReferenceLine, far: ReferenceLine) -> Self {
        Self { near, far }
    }

    /// Pick the lines labelled `near_label` and `far_label`.
    pub fn select(lines: &[ReferenceLine], near_label: &str, far_label: &str) -> Result<Self> {
        let find = |label: &str| {
            lines
                .iter()
                .find(|l| l.label == label)
                .cloned()
                .ok_or_else(|| SpeedcamError::Calibration(format!("no reference line labelled {label:?}")))
        };
        Ok(Self::new(find(near_label)?, find(far_label)?))
    }

    /// Inclusive row range covered by the zone.
    pub fn row_range(&self) -> (i32, i32) {
        let (a, b) = (self.near.image_y, self.far.image_y);
        (a.min(b), a.max(b))
    }

    pub fn contains(&self, center_y: i32) -> bool {
        let (lo, hi) = self.row_range();
        (lo..=hi).contains(&center_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(label: &str, y: i32) -> ReferenceLine {
        ReferenceLine {
            label: label.to_string(),
            real_distance_m: 0.0,
            image_y: y,
        }
    }

    #[test]
    fn zone_membership_is_inclusive_and_order_free() {
        let zone = ZoneLines::new(line("near", 600), line("far", 400));
        assert!(zone.contains(400));
        assert!(zone.contains(600));
        assert!(zone.contains(500));
        assert!(!zone.contains(399));
        assert!(!zone.contains(601));

        let flipped = ZoneLines::new(line("near", 400), line("far", 600));
        assert_eq!(flipped.row_range(), zone.row_range());
    }

    #[test]
    fn select_by_label() {
        let lines = vec![line("far", 300), line("near", 500), line("mid", 400)];
        let zone = ZoneLines::select(&lines, "near", "far").unwrap();
        assert_eq!(zone.near.image_y, 500);
        assert_eq!(zone.far.image_y, 300);
        assert!(matches!(
            ZoneLines::select(&lines, "near", "green"),
            Err(SpeedcamError::Calibration(_))
        ));
    }
}
