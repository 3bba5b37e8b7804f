use speedcam_core::synthetic::{ground_grid, noise::UniformPixelNoise, project_all, roadside_pose};
use speedcam_core::{rotation_angle_between, Camera, FxFyCxCySkew, NoDistortion, Pinhole, Pt2, Pt3};
use speedcam_linear::pnp::reprojection_rms;
use speedcam_linear::{PnpError, PnpSolver};

fn prior_k() -> FxFyCxCySkew<f64> {
    // Same prior the calibration solver derives from a 1280x720 frame.
    FxFyCxCySkew {
        fx: 1280.0,
        fy: 720.0,
        cx: 640.0,
        cy: 360.0,
        skew: 0.0,
    }
}

#[test]
fn four_ground_points_give_exact_pose() {
    let k = prior_k();
    let cam = Camera::new(Pinhole, NoDistortion, k);
    let gt = roadside_pose(5.0, 0.12, -3.0);
    let world = ground_grid(&[15.0, 35.0], &[0.0, 3.5]);
    let image = project_all(&cam, &gt, &world).unwrap();

    let est = PnpSolver::initial_pose(&world, &image, &k).unwrap();
    assert!((est.translation.vector - gt.translation.vector).norm() < 1e-5);
    assert!(rotation_angle_between(&est, &gt) < 1e-6);
}

#[test]
fn non_planar_sets_use_dlt_or_epnp() {
    let k = prior_k();
    let cam = Camera::new(Pinhole, NoDistortion, k);
    let gt = roadside_pose(7.0, 0.2, 2.0);
    let mut world = ground_grid(&[12.0, 24.0, 36.0], &[-2.0, 4.0]);
    world.push(Pt3::new(18.0, 6.0, 2.5));
    world.push(Pt3::new(30.0, -3.0, 4.0));
    let image = project_all(&cam, &gt, &world).unwrap();

    let est = PnpSolver::initial_pose(&world, &image, &k).unwrap();
    let rms = reprojection_rms(&est, &world, &image, &k).unwrap();
    assert!(rms < 1e-4, "rms {rms}");
}

#[test]
fn four_non_coplanar_points_pick_a_consistent_candidate() {
    let k = prior_k();
    let cam = Camera::new(Pinhole, NoDistortion, k);
    let gt = roadside_pose(6.0, 0.15, 1.0);
    let world = vec![
        Pt3::new(15.0, -2.0, 0.0),
        Pt3::new(25.0, 3.0, 0.0),
        Pt3::new(35.0, -1.0, 0.0),
        Pt3::new(20.0, 1.0, 3.0),
    ];
    let image = project_all(&cam, &gt, &world).unwrap();

    let est = PnpSolver::initial_pose(&world, &image, &k).unwrap();
    let rms = reprojection_rms(&est, &world, &image, &k).unwrap();
    assert!(rms < 1e-3, "rms {rms}");
}

#[test]
fn noisy_ground_points_stay_close() {
    let k = prior_k();
    let cam = Camera::new(Pinhole, NoDistortion, k);
    let gt = roadside_pose(6.0, 0.1, -4.0);
    let world = ground_grid(&[10.0, 20.0, 30.0, 40.0], &[-2.0, 1.5, 5.0]);
    let noise = UniformPixelNoise {
        seed: 7,
        max_abs_px: 0.5,
    };
    let image: Vec<Pt2> = project_all(&cam, &gt, &world)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, p)| Pt2::from(noise.apply(i, p.coords)))
        .collect();

    let est = PnpSolver::initial_pose(&world, &image, &k).unwrap();
    assert!(rotation_angle_between(&est, &gt) < 0.03);
    assert!((est.translation.vector - gt.translation.vector).norm() < 1.0);
}

#[test]
fn mismatched_counts_are_rejected() {
    let k = prior_k();
    let world = ground_grid(&[10.0, 20.0], &[0.0, 1.0]);
    let image = vec![Pt2::new(1.0, 2.0); 3];
    assert!(matches!(
        PnpSolver::initial_pose(&world, &image, &k),
        Err(PnpError::CountMismatch { world: 4, image: 3 })
    ));
}
