//! Calibration state for one video session.

use super::io::{load_calibration, save_calibration};
use super::pose::Pose;
use super::solver::{Calibration, CalibrationSolver};
use crate::config::ReferenceDistance;
use crate::error::{Result, SpeedcamError};
use crate::projection::{ProjectionEngine, ReferenceLine};
use log::{debug, info};
use speedcam_core::{CorrespondenceSet, ImageSize};
use std::path::Path;

/// Owns the current pose and the reference lines derived from it.
///
/// The cached lines are dropped whenever the pose or the image size changes.
/// A pose solved here is re-solved from its correspondences when the image
/// size changes, since the intrinsic prior depends on it.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    solver: CalibrationSolver,
    engine: ProjectionEngine,
    distances: Vec<ReferenceDistance>,
    image_size: Option<ImageSize>,
    correspondences: Option<CorrespondenceSet>,
    pose: Option<Pose>,
    /// Image size the pose was solved for; `None` for a loaded pose.
    solved_for: Option<ImageSize>,
    lines: Option<Vec<ReferenceLine>>,
}

impl CalibrationSession {
    pub fn new(
        solver: CalibrationSolver,
        engine: ProjectionEngine,
        distances: Vec<ReferenceDistance>,
    ) -> Self {
        Self {
            solver,
            engine,
            distances,
            image_size: None,
            correspondences: None,
            pose: None,
            solved_for: None,
            lines: None,
        }
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    pub fn correspondences(&self) -> Option<&CorrespondenceSet> {
        self.correspondences.as_ref()
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }

    /// Solve and install a pose for `correspondences`.
    pub fn calibrate(&mut self, correspondences: CorrespondenceSet, image: ImageSize) -> Result<Calibration> {
        let calibration = self.solver.solve(&correspondences, image)?;
        self.image_size = Some(image);
        self.solved_for = Some(image);
        self.correspondences = Some(correspondences);
        self.pose = Some(calibration.pose.clone());
        self.lines = None;
        Ok(calibration)
    }

    /// Install a pose obtained elsewhere (e.g. a calibration file).
    pub fn set_pose(&mut self, pose: Pose, correspondences: CorrespondenceSet) {
        self.pose = Some(pose);
        self.correspondences = Some(correspondences);
        self.solved_for = None;
        self.lines = None;
    }

    pub fn set_image_size(&mut self, image: ImageSize) {
        if self.image_size != Some(image) {
            debug!("image size changed to {image}, dropping reference lines");
            self.image_size = Some(image);
            self.lines = None;
        }
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        let (pose, correspondences) = load_calibration(path)?;
        info!("loaded calibration {}", path.display());
        self.set_pose(pose, correspondences);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        match (&self.pose, &self.correspondences) {
            (Some(pose), Some(set)) => save_calibration(path, pose, set),
            _ => Err(SpeedcamError::Calibration("no calibration to save".to_string())),
        }
    }

    /// Reference lines for the current pose, recomputed after any change.
    ///
    /// # Errors
    ///
    /// [`SpeedcamError::Calibration`] when no pose is installed, when a
    /// re-solve for a new image size fails, or when projection fails.
    pub fn reference_lines(&mut self) -> Result<&[ReferenceLine]> {
        if let (Some(solved), Some(current)) = (self.solved_for, self.image_size) {
            if solved != current {
                if let Some(set) = self.correspondences.clone() {
                    info!("re-solving pose for {current} (was {solved})");
                    self.calibrate(set, current)?;
                }
            }
        }
        if self.lines.is_none() {
            let pose = self
                .pose
                .as_ref()
                .ok_or_else(|| SpeedcamError::Calibration("camera not calibrated yet".to_string()))?;
            self.lines = Some(self.engine.project_lines(pose, &self.distances)?);
        }
        Ok(self.lines.as_deref().unwrap_or_default())
    }
}
