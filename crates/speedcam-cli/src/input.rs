//! Input files accepted by the CLI.

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use speedcam_core::{CorrespondenceSet, Pt2, Pt3, Real};
use speedcam_pipeline::{SpeedcamConfig, TrackedBox};
use std::{fs, path::Path};

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<SpeedcamConfig> {
    match path {
        Some(path) => Ok(SpeedcamConfig::from_json_file(path)?),
        None => Ok(SpeedcamConfig::default()),
    }
}

/// A clicked image point, either `{"x": .., "y": ..}` or `[x, y]`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ClickPoint {
    Object { x: Real, y: Real },
    Pair([Real; 2]),
}

impl From<ClickPoint> for Pt2 {
    fn from(p: ClickPoint) -> Self {
        match p {
            ClickPoint::Object { x, y } => Pt2::new(x, y),
            ClickPoint::Pair([x, y]) => Pt2::new(x, y),
        }
    }
}

/// Clicked image points with the matching road coordinates in metres.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrespondenceInput {
    pub image_points: Vec<ClickPoint>,
    pub object_points: Vec<[Real; 3]>,
}

impl CorrespondenceInput {
    pub fn into_set(self) -> Result<CorrespondenceSet> {
        let points_2d = self.image_points.into_iter().map(Pt2::from).collect();
        let points_3d = self
            .object_points
            .into_iter()
            .map(|[x, y, z]| Pt3::new(x, y, z))
            .collect();
        Ok(CorrespondenceSet::new(points_2d, points_3d)?)
    }
}

/// Tracker output recorded per frame: `[[[x1, y1, x2, y2, id], ...], ...]`.
pub fn load_recorded_tracks(path: &Path) -> Result<Vec<Vec<TrackedBox>>> {
    let frames: Vec<Vec<[Real; 5]>> = load_json_file(path)?;
    Ok(frames
        .into_iter()
        .enumerate()
        .map(|(index, rows)| {
            rows.into_iter()
                .filter_map(|row| {
                    let tracked = TrackedBox::from_row(row);
                    if tracked.is_none() {
                        warn!("frame {index}: dropping row with invalid track id {row:?}");
                    }
                    tracked
                })
                .collect()
        })
        .collect())
}
