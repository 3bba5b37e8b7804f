//! Frame loop driver for one video.

use crate::config::SpeedcamConfig;
use crate::external::{Detector, ObjectTracker, TrackedBox};
use crate::projection::ZoneLines;
use crate::zone::{CrossingEvent, TrackId, ZoneCrossingTracker};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use speedcam_core::Real;

/// Video time from a frame counter.
///
/// The frame rate is read once; a missing, non-positive or non-finite rate
/// falls back to a fixed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: Real,
    frame_count: u64,
}

impl FrameClock {
    pub fn new(reported_fps: Option<Real>, fallback_fps: Real) -> Self {
        let fps = match reported_fps {
            Some(fps) if fps.is_finite() && fps > 0.0 => fps,
            other => {
                warn!("unusable frame rate {other:?}, using {fallback_fps} fps");
                fallback_fps
            }
        };
        Self { fps, frame_count: 0 }
    }

    pub fn fps(&self) -> Real {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advance one frame and return its time; the first frame is at `1 / fps`.
    pub fn tick(&mut self) -> Real {
        self.frame_count += 1;
        self.frame_count as Real / self.fps
    }
}

/// What to draw for one tracked box in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnnotation {
    pub track_id: TrackId,
    pub bbox: TrackedBox,
    pub center: (i32, i32),
    pub in_zone: bool,
    pub last_speed_kmh: Option<Real>,
}

/// Feeds tracked boxes frame by frame into a [`ZoneCrossingTracker`].
///
/// Stopping between frames is always safe: emitted events stay valid and an
/// unfinished crossing simply produces nothing.
#[derive(Debug, Clone)]
pub struct SpeedSession {
    clock: FrameClock,
    tracker: ZoneCrossingTracker,
}

impl SpeedSession {
    pub fn new(zone: ZoneLines, config: &SpeedcamConfig, reported_fps: Option<Real>) -> Self {
        let tracker = ZoneCrossingTracker::new(zone, config.real_distance_m)
            .with_max_tracked_ids(config.max_tracked_ids);
        Self::with_tracker(tracker, FrameClock::new(reported_fps, config.fallback_fps))
    }

    pub fn with_tracker(tracker: ZoneCrossingTracker, clock: FrameClock) -> Self {
        Self { clock, tracker }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn tracker(&self) -> &ZoneCrossingTracker {
        &self.tracker
    }

    /// Advance one frame and observe every tracked box at its integer centre.
    pub fn process_tracks(&mut self, boxes: &[TrackedBox]) -> Vec<TrackAnnotation> {
        let frame_time = self.clock.tick();
        boxes
            .iter()
            .map(|b| {
                let center = b.center();
                self.tracker.observe(b.track_id, center.1, frame_time);
                let state = self.tracker.track_state(b.track_id);
                TrackAnnotation {
                    track_id: b.track_id,
                    bbox: *b,
                    center,
                    in_zone: state.is_some_and(|s| s.active),
                    last_speed_kmh: state.and_then(|s| s.last_speed_kmh),
                }
            })
            .collect()
    }

    /// Detect, track and observe one frame.
    ///
    /// A detector error leaves the session untouched for this frame.
    pub fn process_frame<D, T>(
        &mut self,
        frame: &D::Frame,
        detector: &mut D,
        tracker: &mut T,
    ) -> anyhow::Result<Vec<TrackAnnotation>>
    where
        D: Detector,
        T: ObjectTracker,
    {
        let detections = detector.detect(frame)?;
        let boxes = tracker.update(&detections);
        debug!(
            "frame {}: {} detections, {} tracks",
            self.clock.frame_count() + 1,
            detections.len(),
            boxes.len()
        );
        Ok(self.process_tracks(&boxes))
    }

    pub fn events(&self) -> &[CrossingEvent] {
        self.tracker.events()
    }

    pub fn frames_processed(&self) -> u64 {
        self.clock.frame_count()
    }

    /// End the session and hand over the event log.
    pub fn finish(mut self) -> Vec<CrossingEvent> {
        self.tracker.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_uses_reported_rate() {
        let mut clock = FrameClock::new(Some(30.0), 25.0);
        assert_eq!(clock.tick(), 1.0 / 30.0);
        assert_eq!(clock.tick(), 2.0 / 30.0);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn clock_falls_back_on_bad_rates() {
        for bad in [None, Some(0.0), Some(-12.0), Some(Real::NAN), Some(Real::INFINITY)] {
            let mut clock = FrameClock::new(bad, 25.0);
            assert_eq!(clock.fps(), 25.0);
            assert_eq!(clock.tick(), 0.04);
        }
    }
}
