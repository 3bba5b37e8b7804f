//! Collaborator seams: detector, tracker and clip extraction.
//!
//! Detection models and identity association are outside this crate; callers
//! plug them in through [`Detector`] and [`ObjectTracker`].

use crate::error::{Result, SpeedcamError};
use crate::zone::TrackId;
use log::debug;
use serde::{Deserialize, Serialize};
use speedcam_core::Real;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Axis-aligned detection in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: Real,
    pub y1: Real,
    pub x2: Real,
    pub y2: Real,
    pub confidence: Real,
}

/// Box with a tracker-assigned identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedBox {
    pub x1: Real,
    pub y1: Real,
    pub x2: Real,
    pub y2: Real,
    pub track_id: TrackId,
}

impl TrackedBox {
    /// Build from a tracker output row `[x1, y1, x2, y2, id]`.
    ///
    /// The id is truncated to an integer; `None` if it is negative or not finite.
    pub fn from_row(row: [Real; 5]) -> Option<Self> {
        let [x1, y1, x2, y2, id] = row;
        if !id.is_finite() || id < 0.0 {
            return None;
        }
        Some(Self {
            x1,
            y1,
            x2,
            y2,
            track_id: id.trunc() as TrackId,
        })
    }

    /// Integer pixel centre: coordinates truncated, then floor-halved.
    ///
    /// Coordinates beyond the `i32` range saturate.
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }
}

fn midpoint(a: Real, b: Real) -> i32 {
    // The mean of two i32 values is itself within i32.
    (i64::from(a.trunc() as i32) + i64::from(b.trunc() as i32)).div_euclid(2) as i32
}

/// Object detector run once per frame.
pub trait Detector {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> anyhow::Result<Vec<Detection>>;
}

/// Multi-object tracker associating detections across frames.
pub trait ObjectTracker {
    fn update(&mut self, detections: &[Detection]) -> Vec<TrackedBox>;
}

/// Time span of the source video to cut, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    pub start_s: Real,
    pub end_s: Real,
}

impl ClipWindow {
    pub fn duration_s(&self) -> Real {
        (self.end_s - self.start_s).max(0.0)
    }
}

/// Cuts a clip of `source` into `dest`.
pub trait ClipExtractor {
    fn extract(&self, source: &Path, window: &ClipWindow, dest: &Path) -> Result<()>;
}

/// [`ClipExtractor`] running the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegClipExtractor {
    program: PathBuf,
}

impl Default for FfmpegClipExtractor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegClipExtractor {
    /// Use a specific ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command(&self, source: &Path, window: &ClipWindow, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .args(["-ss", &format!("{:.3}", window.start_s)])
            .arg("-i")
            .arg(source)
            .args(["-t", &format!("{:.3}", window.duration_s())])
            .args(["-c:v", "libx264", "-c:a", "aac"])
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ClipExtractor for FfmpegClipExtractor {
    fn extract(&self, source: &Path, window: &ClipWindow, dest: &Path) -> Result<()> {
        debug!(
            "extracting {:.3}s..{:.3}s of {} into {}",
            window.start_s,
            window.end_s,
            source.display(),
            dest.display()
        );
        let output = self.command(source, window, dest).output().map_err(|e| {
            SpeedcamError::ClipExtraction(format!("failed to run {}: {e}", self.program.display()))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(SpeedcamError::ClipExtraction(format!(
                "ffmpeg exited with {} for {}: {}",
                output.status,
                dest.display(),
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(x1: Real, y1: Real, x2: Real, y2: Real) -> TrackedBox {
        TrackedBox {
            x1,
            y1,
            x2,
            y2,
            track_id: 1,
        }
    }

    #[test]
    fn center_truncates_then_floor_divides() {
        assert_eq!(tracked(10.9, 20.2, 21.7, 31.9).center(), (15, 25));
        assert_eq!(tracked(0.0, 0.0, 3.0, 5.0).center(), (1, 2));
        // Partially off-screen boxes: truncation goes toward zero, halving floors.
        assert_eq!(tracked(-3.7, -1.5, 0.0, 0.0).center(), (-2, -1));
    }

    #[test]
    fn center_saturates_extreme_coordinates() {
        assert_eq!(tracked(3e9, -1e12, 4e9, -2e12).center(), (i32::MAX, i32::MIN));
        assert_eq!(tracked(Real::MAX, 0.0, Real::MIN, 0.0).center(), (-1, 0));
    }

    #[test]
    fn tracker_rows_truncate_ids() {
        let b = TrackedBox::from_row([1.0, 2.0, 3.0, 4.0, 17.9]).unwrap();
        assert_eq!(b.track_id, 17);
        assert!(TrackedBox::from_row([1.0, 2.0, 3.0, 4.0, -1.0]).is_none());
        assert!(TrackedBox::from_row([1.0, 2.0, 3.0, 4.0, Real::NAN]).is_none());
    }

    #[test]
    fn ffmpeg_arguments_follow_clip_window() {
        let cmd = FfmpegClipExtractor::default().command(
            Path::new("in.mp4"),
            &ClipWindow {
                start_s: 3.5,
                end_s: 7.25,
            },
            Path::new("out/clip.mp4"),
        );
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-y", "-ss", "3.500", "-i", "in.mp4", "-t", "3.750", "-c:v", "libx264", "-c:a",
                "aac", "out/clip.mp4"
            ]
        );
        assert_eq!(cmd.get_program(), "ffmpeg");
    }

    #[test]
    fn missing_binary_is_clip_extraction_error() {
        let extractor = FfmpegClipExtractor::with_program("/nonexistent/ffmpeg-binary");
        let err = extractor
            .extract(
                Path::new("in.mp4"),
                &ClipWindow {
                    start_s: 0.0,
                    end_s: 1.0,
                },
                Path::new("out.mp4"),
            )
            .unwrap_err();
        assert!(matches!(err, SpeedcamError::ClipExtraction(_)));
    }
}
