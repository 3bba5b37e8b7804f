use crate::external::ClipWindow;
use crate::zone::{CrossingEvent, TrackId};
use serde::{Deserialize, Serialize};
use speedcam_core::Real;

pub const DEFAULT_CLIP_PADDING_S: Real = 0.5;

/// A crossing fast enough to report, with the video span to clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCandidate {
    pub track_id: TrackId,
    pub speed_kmh: Real,
    pub duration_s: Real,
    pub wall_timestamp: Real,
    pub clip_start_s: Real,
    pub clip_end_s: Real,
}

impl ReportCandidate {
    pub fn window(&self) -> ClipWindow {
        ClipWindow {
            start_s: self.clip_start_s,
            end_s: self.clip_end_s,
        }
    }
}

/// Keeps crossings strictly above a speed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportFilter {
    pub threshold_kmh: Real,
    pub padding_s: Real,
}

impl ReportFilter {
    pub fn new(threshold_kmh: Real, padding_s: Real) -> Self {
        Self {
            threshold_kmh,
            padding_s,
        }
    }

    /// `None` unless `event.speed_kmh > threshold_kmh`.
    ///
    /// The clip starts `padding_s` before entry. When that would be negative
    /// it starts at zero and the lost lead-in is added after exit instead.
    pub fn apply(&self, event: &CrossingEvent) -> Option<ReportCandidate> {
        if event.speed_kmh.is_nan() || event.speed_kmh <= self.threshold_kmh {
            return None;
        }
        let raw_start = event.entry_time - self.padding_s;
        let (clip_start_s, clip_end_s) = if raw_start < 0.0 {
            (0.0, event.exit_time + 2.0 * self.padding_s)
        } else {
            (raw_start, event.exit_time + self.padding_s)
        };
        Some(ReportCandidate {
            track_id: event.track_id,
            speed_kmh: event.speed_kmh,
            duration_s: event.duration_s,
            wall_timestamp: event.wall_timestamp,
            clip_start_s,
            clip_end_s,
        })
    }
}

/// [`ReportFilter::apply`] with the default clip padding.
pub fn filter(event: &CrossingEvent, threshold_kmh: Real) -> Option<ReportCandidate> {
    ReportFilter::new(threshold_kmh, DEFAULT_CLIP_PADDING_S).apply(event)
}

/// `clip_track_{track_id}_{whole seconds of wall_timestamp}.mp4`
pub fn clip_file_name(track_id: TrackId, wall_timestamp: Real) -> String {
    clip_file_name_nth(track_id, wall_timestamp, 1)
}

/// Name of the `nth` clip sharing a track id and wall-clock second.
///
/// The first keeps the plain name; later ones get `_{nth}` before the extension.
pub fn clip_file_name_nth(track_id: TrackId, wall_timestamp: Real, nth: u32) -> String {
    let secs = wall_timestamp.trunc() as i64;
    match nth {
        0 | 1 => format!("clip_track_{track_id}_{secs}.mp4"),
        n => format!("clip_track_{track_id}_{secs}_{n}.mp4"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(speed_kmh: Real, entry: Real, exit: Real) -> CrossingEvent {
        CrossingEvent {
            track_id: 5,
            speed_kmh,
            duration_s: exit - entry,
            wall_timestamp: 1_700_000_042.9,
            entry_time: entry,
            exit_time: exit,
        }
    }

    #[test]
    fn threshold_is_strict() {
        assert!(filter(&event(60.0, 4.0, 5.0), 60.0).is_none());
        assert!(filter(&event(60.01, 4.0, 5.0), 60.0).is_some());
        assert!(filter(&event(59.0, 4.0, 5.0), 60.0).is_none());
    }

    #[test]
    fn window_pads_both_sides() {
        let c = filter(&event(90.0, 4.0, 4.8), 60.0).unwrap();
        assert_eq!(c.clip_start_s, 3.5);
        assert!((c.clip_end_s - 5.3).abs() < 1e-12);
    }

    #[test]
    fn early_entry_clamps_start_and_extends_end() {
        let c = filter(&event(90.0, 0.2, 1.0), 60.0).unwrap();
        assert_eq!(c.clip_start_s, 0.0);
        assert_eq!(c.clip_end_s, 2.0);
        assert!(c.clip_end_s >= 1.5);
    }

    #[test]
    fn entry_exactly_at_padding_is_not_clamped() {
        let c = filter(&event(90.0, 0.5, 1.0), 60.0).unwrap();
        assert_eq!(c.clip_start_s, 0.0);
        assert_eq!(c.clip_end_s, 1.5);
    }

    #[test]
    fn custom_padding() {
        let c = ReportFilter::new(50.0, 1.0).apply(&event(70.0, 0.5, 2.0)).unwrap();
        assert_eq!((c.clip_start_s, c.clip_end_s), (0.0, 4.0));
    }

    #[test]
    fn clip_names_use_whole_seconds() {
        assert_eq!(clip_file_name(12, 1_700_000_042.9), "clip_track_12_1700000042.mp4");
        assert_eq!(clip_file_name_nth(12, 1_700_000_042.1, 3), "clip_track_12_1700000042_3.mp4");
    }
}
