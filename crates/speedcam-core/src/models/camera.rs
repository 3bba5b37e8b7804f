use nalgebra::{Point3, RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::{DistortionModel, IntrinsicsModel};

/// Maps a camera-frame direction onto the normalized image plane.
pub trait ProjectionModel<S: RealField + Copy> {
    /// `None` for directions that do not reach the image plane.
    fn project_dir(&self, dir_c: &Vector3<S>) -> Option<Vector2<S>>;
}

/// Perspective division by depth.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Pinhole;

impl<S: RealField + Copy> ProjectionModel<S> for Pinhole {
    fn project_dir(&self, dir_c: &Vector3<S>) -> Option<Vector2<S>> {
        (dir_c.z > S::zero()).then(|| Vector2::new(dir_c.x / dir_c.z, dir_c.y / dir_c.z))
    }
}

/// A composable camera: projection, then distortion, then intrinsics.
#[derive(Clone, Debug)]
pub struct Camera<S, P, D, K>
where
    S: RealField + Copy,
    P: ProjectionModel<S>,
    D: DistortionModel<S>,
    K: IntrinsicsModel<S>,
{
    pub proj: P,
    pub dist: D,
    pub k: K,
    _phantom: core::marker::PhantomData<S>,
}

impl<S, P, D, K> Camera<S, P, D, K>
where
    S: RealField + Copy,
    P: ProjectionModel<S>,
    D: DistortionModel<S>,
    K: IntrinsicsModel<S>,
{
    pub fn new(proj: P, dist: D, k: K) -> Self {
        Self {
            proj,
            dist,
            k,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Project a point given in camera coordinates.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project_point_c(&self, p_c: &Vector3<S>) -> Option<Vector2<S>> {
        if p_c.z <= S::zero() {
            return None;
        }
        let n_u = self.proj.project_dir(p_c)?;
        let n_d = self.dist.distort(&n_u);
        Some(self.k.sensor_to_pixel(&n_d))
    }

    pub fn project_point(&self, p_c: &Point3<S>) -> Option<Vector2<S>> {
        self.project_point_c(&p_c.coords)
    }
}
