use super::arena::TrackArena;
use crate::projection::ZoneLines;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use speedcam_core::Real;

/// Identity assigned by the multi-object tracker.
pub type TrackId = u64;

/// Round to two decimals.
pub fn round2(x: Real) -> Real {
    (x * 100.0).round() / 100.0
}

/// Seconds since the Unix epoch, from the system clock.
fn system_wall_clock() -> Real {
    chrono::Utc::now().timestamp_micros() as Real / 1e6
}

/// Zone state of one track. `active` is the `InZone` state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackState {
    pub active: bool,
    pub entry_time: Option<Real>,
    pub exit_time: Option<Real>,
    pub last_speed_kmh: Option<Real>,
}

/// One completed zone crossing. Field names on disk follow the speed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub track_id: TrackId,
    pub speed_kmh: Real,
    pub duration_s: Real,
    /// Wall-clock time the crossing completed, Unix seconds.
    #[serde(rename = "timestamp")]
    pub wall_timestamp: Real,
    /// Video time of zone entry, seconds.
    #[serde(rename = "start_time")]
    pub entry_time: Real,
    /// Video time of zone exit, seconds.
    #[serde(rename = "end_time")]
    pub exit_time: Real,
}

/// Per-track zone-crossing state machine for one video session.
#[derive(Debug, Clone)]
pub struct ZoneCrossingTracker {
    zone: ZoneLines,
    real_distance_m: Real,
    arena: TrackArena,
    events: Vec<CrossingEvent>,
    wall_clock: fn() -> Real,
}

impl ZoneCrossingTracker {
    /// `real_distance_m` is the road distance covered inside the zone; it is
    /// independent of the distances the lines were projected from.
    pub fn new(zone: ZoneLines, real_distance_m: Real) -> Self {
        Self {
            zone,
            real_distance_m,
            arena: TrackArena::new(None),
            events: Vec::new(),
            wall_clock: system_wall_clock,
        }
    }

    /// Bound the number of tracked ids (`None` keeps all).
    pub fn with_max_tracked_ids(mut self, max: Option<usize>) -> Self {
        self.arena = TrackArena::new(max);
        self
    }

    /// Replace the wall clock used for event timestamps.
    pub fn with_wall_clock(mut self, clock: fn() -> Real) -> Self {
        self.wall_clock = clock;
        self
    }

    pub fn zone(&self) -> &ZoneLines {
        &self.zone
    }

    pub fn real_distance_m(&self) -> Real {
        self.real_distance_m
    }

    pub fn max_tracked_ids(&self) -> Option<usize> {
        self.arena.capacity()
    }

    /// Feed one observation of `track_id` at image row `center_y`, video time `frame_time_s`.
    ///
    /// Returns the event when this observation completes a crossing.
    pub fn observe(&mut self, track_id: TrackId, center_y: i32, frame_time_s: Real) -> Option<CrossingEvent> {
        let inside = self.zone.contains(center_y);
        let state = self.arena.touch(track_id);

        match (state.active, inside) {
            (false, true) => {
                state.active = true;
                state.entry_time = Some(frame_time_s);
                debug!("track {track_id} entered zone at {frame_time_s:.3}s (y={center_y})");
                None
            }
            (true, false) => {
                state.active = false;
                state.exit_time = Some(frame_time_s);
                let entry = state.entry_time.unwrap_or(frame_time_s);
                let duration = frame_time_s - entry;
                if duration.is_nan() || duration <= 0.0 {
                    debug!("track {track_id} left zone without elapsed time, no measurement");
                    return None;
                }
                let speed_kmh = round2(self.real_distance_m / duration * 3.6);
                state.last_speed_kmh = Some(speed_kmh);

                let event = CrossingEvent {
                    track_id,
                    speed_kmh,
                    duration_s: round2(duration),
                    wall_timestamp: (self.wall_clock)(),
                    entry_time: entry,
                    exit_time: frame_time_s,
                };
                info!(
                    "track {track_id}: {speed_kmh} km/h over {:.2}s ({entry:.3}s -> {frame_time_s:.3}s)",
                    event.duration_s
                );
                self.events.push(event.clone());
                Some(event)
            }
            _ => None,
        }
    }

    /// Events emitted so far, in emission order.
    pub fn events(&self) -> &[CrossingEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<CrossingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn track_state(&self, track_id: TrackId) -> Option<&TrackState> {
        self.arena.get(track_id)
    }

    pub fn in_zone(&self, track_id: TrackId) -> bool {
        self.arena.get(track_id).is_some_and(|s| s.active)
    }

    /// Currently tracked ids, ascending.
    pub fn tracked_ids(&self) -> Vec<TrackId> {
        self.arena.ids()
    }

    /// Forget all per-track state; the event log is kept.
    pub fn clear(&mut self) {
        self.arena.clear();
    }
}
