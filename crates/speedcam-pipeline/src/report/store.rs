use super::filter::ReportCandidate;
use crate::error::{Result, SpeedcamError};
use crate::zone::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use speedcam_core::Real;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A persisted speed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub track_id: TrackId,
    pub speed_kmh: Real,
    pub duration_s: Real,
    pub timestamp: DateTime<Utc>,
    pub clip_path: String,
    pub video_filename: String,
}

impl ReportRecord {
    /// New record with a fresh id; the timestamp comes from the crossing's wall clock.
    pub fn from_candidate(
        candidate: &ReportCandidate,
        clip_path: impl Into<String>,
        video_filename: impl Into<String>,
    ) -> Result<Self> {
        let micros = (candidate.wall_timestamp * 1e6).round();
        let timestamp = DateTime::from_timestamp_micros(micros as i64)
            .filter(|_| micros.is_finite())
            .ok_or_else(|| {
                SpeedcamError::Store(format!(
                    "track {}: wall timestamp {} is out of range",
                    candidate.track_id, candidate.wall_timestamp
                ))
            })?;
        Ok(Self {
            id: Uuid::new_v4(),
            track_id: candidate.track_id,
            speed_kmh: candidate.speed_kmh,
            duration_s: candidate.duration_s,
            timestamp,
            clip_path: clip_path.into(),
            video_filename: video_filename.into(),
        })
    }
}

/// Storage for speed reports.
pub trait ReportStore {
    fn insert(&mut self, record: ReportRecord) -> Result<()>;

    /// Reports with `speed_kmh > threshold_kmh`, newest first.
    fn fetch_above(&self, threshold_kmh: Real) -> Result<Vec<ReportRecord>>;

    fn fetch_by_id(&self, id: Uuid) -> Result<Option<ReportRecord>>;
}

/// [`ReportStore`] backed by a JSON array file.
///
/// A missing file is an empty store; writes replace the file through a
/// temporary sibling.
#[derive(Debug, Clone)]
pub struct JsonReportStore {
    path: PathBuf,
}

impl JsonReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<ReportRecord>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| SpeedcamError::format(Some(&self.path), e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(SpeedcamError::io(&self.path, e)),
        }
    }

    fn write_all(&self, records: &[ReportRecord]) -> Result<()> {
        let text = serde_json::to_string_pretty(records)
            .map_err(|e| SpeedcamError::Store(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| SpeedcamError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| SpeedcamError::io(&self.path, e))
    }
}

impl ReportStore for JsonReportStore {
    fn insert(&mut self, record: ReportRecord) -> Result<()> {
        let mut records = self.read_all()?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(SpeedcamError::Store(format!("duplicate report id {}", record.id)));
        }
        records.push(record);
        self.write_all(&records)
    }

    fn fetch_above(&self, threshold_kmh: Real) -> Result<Vec<ReportRecord>> {
        let mut records: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.speed_kmh > threshold_kmh)
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    fn fetch_by_id(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        Ok(self.read_all()?.into_iter().find(|r| r.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(track_id: TrackId, speed_kmh: Real, wall_timestamp: Real) -> ReportCandidate {
        ReportCandidate {
            track_id,
            speed_kmh,
            duration_s: 1.0,
            wall_timestamp,
            clip_start_s: 0.0,
            clip_end_s: 2.0,
        }
    }

    #[test]
    fn record_timestamp_comes_from_wall_clock() {
        let r = ReportRecord::from_candidate(&candidate(1, 80.0, 1_700_000_000.25), "c.mp4", "v.mp4")
            .unwrap();
        assert_eq!(r.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(r.timestamp.timestamp_subsec_millis(), 250);
        assert_eq!(r.id.get_version_num(), 4);
    }

    #[test]
    fn non_finite_timestamp_is_store_error() {
        let err = ReportRecord::from_candidate(&candidate(1, 80.0, Real::NAN), "c", "v").unwrap_err();
        assert!(matches!(err, SpeedcamError::Store(_)));
    }

    #[test]
    fn fetch_above_filters_and_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonReportStore::new(dir.path().join("reports.json"));
        assert!(store.fetch_above(0.0).unwrap().is_empty());

        for (track, speed, ts) in [(1, 70.0, 100.0), (2, 90.0, 300.0), (3, 60.0, 200.0), (4, 65.0, 250.0)] {
            let rec = ReportRecord::from_candidate(&candidate(track, speed, ts), "clip", "video.mp4").unwrap();
            store.insert(rec).unwrap();
        }

        let above: Vec<_> = store.fetch_above(60.0).unwrap().iter().map(|r| r.track_id).collect();
        assert_eq!(above, vec![2, 4, 1]);
    }

    #[test]
    fn fetch_by_id_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonReportStore::new(dir.path().join("reports.json"));
        let rec = ReportRecord::from_candidate(&candidate(9, 99.0, 5.0), "clip", "video.mp4").unwrap();
        store.insert(rec.clone()).unwrap();

        assert_eq!(store.fetch_by_id(rec.id).unwrap(), Some(rec.clone()));
        assert_eq!(store.fetch_by_id(Uuid::new_v4()).unwrap(), None);
        assert!(matches!(store.insert(rec), Err(SpeedcamError::Store(_))));
    }
}
