use super::filter::{clip_file_name_nth, ReportFilter};
use super::store::{ReportRecord, ReportStore};
use crate::error::{Result, SpeedcamError};
use crate::external::ClipExtractor;
use crate::zone::{CrossingEvent, TrackId};
use log::{info, warn};
use speedcam_core::Real;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A report that could not be published.
#[derive(Debug)]
pub struct PublishFailure {
    pub track_id: TrackId,
    pub error: SpeedcamError,
}

/// Outcome of [`ReportPublisher::publish`].
#[derive(Debug, Default)]
pub struct PublishSummary {
    pub inserted: Vec<ReportRecord>,
    /// Events at or below the threshold.
    pub skipped: usize,
    pub failures: Vec<PublishFailure>,
}

impl PublishSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns speed-log events into stored reports with video clips.
#[derive(Debug)]
pub struct ReportPublisher<C, S> {
    extractor: C,
    store: S,
    filter: ReportFilter,
    clip_dir: PathBuf,
}

impl<C: ClipExtractor, S: ReportStore> ReportPublisher<C, S> {
    pub fn new(extractor: C, store: S, filter: ReportFilter, clip_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor,
            store,
            filter,
            clip_dir: clip_dir.into(),
        }
    }

    pub fn extractor(&self) -> &C {
        &self.extractor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Publish every event above the threshold.
    ///
    /// A failing event is recorded in [`PublishSummary::failures`] and the
    /// remaining events are still processed.
    ///
    /// # Errors
    ///
    /// Only when the clip directory cannot be created.
    pub fn publish(
        &mut self,
        events: &[CrossingEvent],
        source_video: &Path,
        video_filename: &str,
    ) -> Result<PublishSummary> {
        std::fs::create_dir_all(&self.clip_dir).map_err(|e| SpeedcamError::io(&self.clip_dir, e))?;

        let mut summary = PublishSummary::default();
        let mut claimed = HashSet::new();
        for event in events {
            let Some(candidate) = self.filter.apply(event) else {
                summary.skipped += 1;
                continue;
            };
            let clip_path =
                self.unused_clip_path(&mut claimed, candidate.track_id, candidate.wall_timestamp);

            let outcome = self
                .extractor
                .extract(source_video, &candidate.window(), &clip_path)
                .and_then(|()| verify_clip(&clip_path))
                .and_then(|()| {
                    ReportRecord::from_candidate(
                        &candidate,
                        clip_path.to_string_lossy(),
                        video_filename,
                    )
                })
                .and_then(|record| self.store.insert(record.clone()).map(|()| record));

            match outcome {
                Ok(record) => {
                    info!(
                        "reported track {} at {} km/h ({})",
                        record.track_id, record.speed_kmh, record.clip_path
                    );
                    summary.inserted.push(record);
                }
                Err(error) => {
                    warn!("could not publish track {}: {error}", candidate.track_id);
                    summary.failures.push(PublishFailure {
                        track_id: candidate.track_id,
                        error,
                    });
                }
            }
        }
        Ok(summary)
    }
}

impl<C, S> ReportPublisher<C, S> {
    /// First clip path for this track and second that neither an earlier event
    /// of this run nor an existing file already uses.
    fn unused_clip_path(
        &self,
        claimed: &mut HashSet<PathBuf>,
        track_id: TrackId,
        wall_timestamp: Real,
    ) -> PathBuf {
        let mut nth = 1;
        loop {
            let path = self
                .clip_dir
                .join(clip_file_name_nth(track_id, wall_timestamp, nth));
            if !claimed.contains(&path) && !path.exists() {
                claimed.insert(path.clone());
                return path;
            }
            nth += 1;
        }
    }
}

fn verify_clip(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(SpeedcamError::ClipExtraction(format!(
            "clip {} is empty",
            path.display()
        ))),
        Err(_) => Err(SpeedcamError::ClipExtraction(format!(
            "clip {} was not created",
            path.display()
        ))),
    }
}
