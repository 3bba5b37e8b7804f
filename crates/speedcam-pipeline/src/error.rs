//! Error taxonomy of the pipeline.

use speedcam_core::ValidationError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = SpeedcamError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SpeedcamError {
    /// Malformed or insufficient calibration input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The pose could not be solved, or is missing or unusable for projection.
    #[error("calibration failed: {0}")]
    Calibration(String),
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    /// A file or in-memory record has the wrong structure.
    #[error("malformed {}: {reason}", origin(.path))]
    Format { path: Option<PathBuf>, reason: String },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("clip extraction failed: {0}")]
    ClipExtraction(String),
    #[error("report store error: {0}")]
    Store(String),
}

fn origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "record".to_string(),
    }
}

impl SpeedcamError {
    /// Map an I/O error on `path`, turning `NotFound` into [`SpeedcamError::NotFound`].
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            SpeedcamError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SpeedcamError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn format(path: Option<&Path>, reason: impl Into<String>) -> Self {
        SpeedcamError::Format {
            path: path.map(Path::to_path_buf),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = SpeedcamError::io(
            Path::new("/nope/calib.json"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, SpeedcamError::NotFound { .. }));
        assert_eq!(err.to_string(), "file not found: /nope/calib.json");
    }

    #[test]
    fn format_error_names_its_origin() {
        let err = SpeedcamError::format(None, "missing field `rvec`");
        assert_eq!(err.to_string(), "malformed record: missing field `rvec`");
        let err = SpeedcamError::format(Some(Path::new("a.json")), "bad");
        assert_eq!(err.to_string(), "malformed a.json: bad");
    }
}
