//! JSON calibration files.
//!
//! Layout (column vectors are written nested, one value per row):
//!
//! ```json
//! {
//!   "intrinsic": [[1280.0, 0.0, 640.0], [0.0, 720.0, 360.0], [0.0, 0.0, 1.0]],
//!   "dist_coeffs": [[0.0], [0.0], [0.0], [0.0]],
//!   "rvec": [[1.2], [-1.1], [1.3]],
//!   "tvec": [[0.4], [5.9], [1.0]],
//!   "image_points": [[412.0, 655.0], ...],
//!   "object_points": [[10.0, 0.0, 0.0], ...]
//! }
//! ```

use super::pose::Pose;
use crate::error::{Result, SpeedcamError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use speedcam_core::{CorrespondenceSet, Mat3, Pt2, Pt3, RadialTangential4, Real, Vec3};
use std::path::Path;

/// Column vector accepting both `[[a], [b]]` and `[a, b]`; always written nested.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnVector(pub Vec<Real>);

impl Serialize for ColumnVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let nested: Vec<[Real; 1]> = self.0.iter().map(|&v| [v]).collect();
        nested.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Nested(Vec<[Real; 1]>),
            Flat(Vec<Real>),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Nested(rows) => ColumnVector(rows.into_iter().map(|[v]| v).collect()),
            Repr::Flat(values) => ColumnVector(values),
        })
    }
}

/// On-disk form of a calibration: pose plus the correspondences it was solved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub intrinsic: [[Real; 3]; 3],
    pub dist_coeffs: ColumnVector,
    pub rvec: ColumnVector,
    pub tvec: ColumnVector,
    pub image_points: Vec<[Real; 2]>,
    pub object_points: Vec<[Real; 3]>,
}

/// Build the record for a pose and its correspondences.
pub fn serialize(pose: &Pose, correspondences: &CorrespondenceSet) -> CalibrationRecord {
    let k = pose.intrinsic();
    CalibrationRecord {
        intrinsic: std::array::from_fn(|r| std::array::from_fn(|c| k[(r, c)])),
        dist_coeffs: ColumnVector(pose.distortion().coeffs().to_vec()),
        rvec: ColumnVector(pose.rvec().iter().copied().collect()),
        tvec: ColumnVector(pose.tvec().iter().copied().collect()),
        image_points: correspondences.points_2d().iter().map(|p| [p.x, p.y]).collect(),
        object_points: correspondences
            .points_3d()
            .iter()
            .map(|p| [p.x, p.y, p.z])
            .collect(),
    }
}

fn column<const N: usize>(name: &str, col: &ColumnVector) -> std::result::Result<[Real; N], String> {
    <[Real; N]>::try_from(col.0.as_slice())
        .map_err(|_| format!("`{name}` must have {N} entries, got {}", col.0.len()))
}

fn decode(record: &CalibrationRecord) -> std::result::Result<(Pose, CorrespondenceSet), String> {
    let dist = column::<4>("dist_coeffs", &record.dist_coeffs)?;
    let rvec = column::<3>("rvec", &record.rvec)?;
    let tvec = column::<3>("tvec", &record.tvec)?;

    let intrinsic = Mat3::from_fn(|r, c| record.intrinsic[r][c]);
    let pose = Pose::from_parts(
        intrinsic,
        RadialTangential4::from_coeffs(dist),
        Vec3::from(rvec),
        Vec3::from(tvec),
    )
    .ok_or_else(|| "intrinsic/pose values are not a finite pinhole calibration".to_string())?;

    let correspondences = CorrespondenceSet::new(
        record.image_points.iter().map(|&[x, y]| Pt2::new(x, y)).collect(),
        record
            .object_points
            .iter()
            .map(|&[x, y, z]| Pt3::new(x, y, z))
            .collect(),
    )
    .map_err(|e| e.to_string())?;

    Ok((pose, correspondences))
}

/// Restore a pose and its correspondences from a record.
///
/// # Errors
///
/// [`SpeedcamError::Format`] when a vector has the wrong length, the
/// intrinsic is not a pinhole matrix, or the correspondences are invalid.
pub fn deserialize(record: &CalibrationRecord) -> Result<(Pose, CorrespondenceSet)> {
    decode(record).map_err(|reason| SpeedcamError::format(None, reason))
}

pub fn to_json_string(record: &CalibrationRecord) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(|e| SpeedcamError::format(None, e.to_string()))
}

pub fn from_json_str(text: &str) -> Result<CalibrationRecord> {
    serde_json::from_str(text).map_err(|e| SpeedcamError::format(None, e.to_string()))
}

/// Write `pose` and `correspondences` to `path` as a calibration file.
pub fn save_calibration(path: &Path, pose: &Pose, correspondences: &CorrespondenceSet) -> Result<()> {
    let text = to_json_string(&serialize(pose, correspondences))?;
    std::fs::write(path, text).map_err(|e| SpeedcamError::io(path, e))?;
    log::info!("saved calibration to {}", path.display());
    Ok(())
}

/// Read a calibration file.
///
/// # Errors
///
/// [`SpeedcamError::NotFound`] if the file does not exist,
/// [`SpeedcamError::Format`] if it is not a valid calibration.
pub fn load_calibration(path: &Path) -> Result<(Pose, CorrespondenceSet)> {
    let text = std::fs::read_to_string(path).map_err(|e| SpeedcamError::io(path, e))?;
    let record: CalibrationRecord =
        serde_json::from_str(&text).map_err(|e| SpeedcamError::format(Some(path), e.to_string()))?;
    decode(&record).map_err(|reason| SpeedcamError::format(Some(path), reason))
}

/// Sorted names of the `*.json` files in `dir`.
pub fn list_calibrations(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SpeedcamError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SpeedcamError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL_LAYOUT: &str = r#"{
        "intrinsic": [[1280.0, 0.0, 640.0], [0.0, 720.0, 360.0], [0.0, 0.0, 1.0]],
        "dist_coeffs": [[0.0], [0.0], [0.0], [0.0]],
        "rvec": [[1.2091995761561452], [-1.2091995761561452], [1.2091995761561452]],
        "tvec": [[0.1], [6.0], [0.5]],
        "image_points": [[100.0, 600.0], [1100.0, 600.0], [900.0, 300.0], [300.0, 300.0]],
        "object_points": [[10.0, 0.0, 0.0], [10.0, 7.0, 0.0], [30.0, 7.0, 0.0], [30.0, 0.0, 0.0]]
    }"#;

    #[test]
    fn reads_nested_columns() {
        let record = from_json_str(ORIGINAL_LAYOUT).unwrap();
        let (pose, set) = deserialize(&record).unwrap();
        assert_eq!(pose.tvec(), &Vec3::new(0.1, 6.0, 0.5));
        assert_eq!(set.len(), 4);
        assert_eq!(set.points_3d()[2], Pt3::new(30.0, 7.0, 0.0));
    }

    #[test]
    fn reads_flat_columns_and_writes_nested() {
        let text = ORIGINAL_LAYOUT
            .replace("[[0.1], [6.0], [0.5]]", "[0.1, 6.0, 0.5]")
            .replace("[[0.0], [0.0], [0.0], [0.0]]", "[0.0, 0.0, 0.0, 0.0]");
        let record = from_json_str(&text).unwrap();
        assert_eq!(record.tvec, ColumnVector(vec![0.1, 6.0, 0.5]));

        let json: serde_json::Value = serde_json::from_str(&to_json_string(&record).unwrap()).unwrap();
        assert_eq!(json["tvec"], serde_json::json!([[0.1], [6.0], [0.5]]));
    }

    #[test]
    fn wrong_vector_length_is_format_error() {
        let text = ORIGINAL_LAYOUT.replace("[[0.1], [6.0], [0.5]]", "[[0.1], [6.0]]");
        let err = deserialize(&from_json_str(&text).unwrap()).unwrap_err();
        match err {
            SpeedcamError::Format { reason, .. } => assert!(reason.contains("tvec"), "{reason}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_format_error() {
        let text = ORIGINAL_LAYOUT.replace("\"rvec\"", "\"rotation\"");
        assert!(matches!(from_json_str(&text), Err(SpeedcamError::Format { .. })));
    }

    #[test]
    fn too_few_points_is_format_error() {
        let text = ORIGINAL_LAYOUT
            .replace(", [300.0, 300.0]]", "]")
            .replace(", [30.0, 0.0, 0.0]]", "]");
        let err = deserialize(&from_json_str(&text).unwrap()).unwrap_err();
        assert!(matches!(err, SpeedcamError::Format { .. }));
    }
}
