use speedcam_core::{
    iso_from_rvec_tvec, make_pinhole_camera, CorrespondenceSet, FxFyCxCySkew, Iso3, Mat3,
    PinholeCamera, Pt2, Pt3, RadialTangential4, Real, Vec3,
};

/// A solved camera pose together with the intrinsics it was solved with.
///
/// Only a successful solve or a validated calibration record produces a
/// `Pose`, so every instance has all four parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    intrinsic: Mat3,
    distortion: RadialTangential4<Real>,
    rvec: Vec3,
    tvec: Vec3,
    k: FxFyCxCySkew<Real>,
}

impl Pose {
    /// `None` when `intrinsic` is not an upper-triangular pinhole matrix
    /// with positive focal lengths, or any value is non-finite.
    pub(crate) fn from_parts(
        intrinsic: Mat3,
        distortion: RadialTangential4<Real>,
        rvec: Vec3,
        tvec: Vec3,
    ) -> Option<Self> {
        let finite = intrinsic.iter().all(|v| v.is_finite())
            && distortion.coeffs().iter().all(|v| v.is_finite())
            && rvec.iter().all(|v| v.is_finite())
            && tvec.iter().all(|v| v.is_finite());
        let pinhole = intrinsic[(1, 0)] == 0.0
            && intrinsic[(2, 0)] == 0.0
            && intrinsic[(2, 1)] == 0.0
            && intrinsic[(2, 2)] == 1.0;
        if !finite || !pinhole {
            return None;
        }
        let k = FxFyCxCySkew::from_k_matrix(&intrinsic)?;
        if k.fx <= 0.0 || k.fy <= 0.0 {
            return None;
        }
        Some(Self {
            intrinsic,
            distortion,
            rvec,
            tvec,
            k,
        })
    }

    /// 3x3 intrinsic matrix `K`.
    pub fn intrinsic(&self) -> &Mat3 {
        &self.intrinsic
    }

    /// Distortion `(k1, k2, p1, p2)`.
    pub fn distortion(&self) -> &RadialTangential4<Real> {
        &self.distortion
    }

    /// Rodrigues rotation vector of `T_C_W`.
    pub fn rvec(&self) -> &Vec3 {
        &self.rvec
    }

    /// Translation of `T_C_W`.
    pub fn tvec(&self) -> &Vec3 {
        &self.tvec
    }

    /// Pinhole camera model built from `K` and the distortion.
    pub fn camera(&self) -> PinholeCamera {
        make_pinhole_camera(self.k, self.distortion)
    }

    /// World-to-camera transform `T_C_W`.
    pub fn cam_from_world(&self) -> Iso3 {
        iso_from_rvec_tvec(&self.rvec, &self.tvec)
    }

    /// Project a world point to pixels; `None` if it is on or behind the camera plane.
    pub fn project_world_point(&self, point: &Pt3) -> Option<Pt2> {
        let pc = self.cam_from_world().transform_point(point);
        self.camera().project_point(&pc).map(Pt2::from)
    }

    /// Pixel RMS reprojection error over a correspondence set.
    ///
    /// `None` when any world point projects behind the camera.
    pub fn reprojection_rms(&self, set: &CorrespondenceSet) -> Option<Real> {
        let camera = self.camera();
        let iso = self.cam_from_world();
        let mut sum_sq = 0.0;
        for (p2, p3) in set.iter() {
            let uv = Pt2::from(camera.project_point(&iso.transform_point(p3))?);
            sum_sq += (uv - p2).norm_squared();
        }
        Some((sum_sq / set.len() as Real).sqrt())
    }
}
