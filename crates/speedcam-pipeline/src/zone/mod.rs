//! Zone-crossing speed measurement.
//!
//! Each track runs a two-state machine (`Idle` / `InZone`) against the row
//! range bounded by the near and far reference lines. Leaving the zone after
//! a positive dwell time emits a [`CrossingEvent`] whose speed is the
//! configured road distance divided by the dwell time.

mod arena;
mod speed_log;
mod tracker;

pub use speed_log::{load_speed_log, save_speed_log};
pub use tracker::{round2, CrossingEvent, TrackId, TrackState, ZoneCrossingTracker};
