//! Camera ray geometry and stereo triangulation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Point3, Vector3};

use comms_if::eqpt::cam::Resolution;
use util::maths::lin_map;

use super::{CameraRay, Location, TrackingError, TrackingParams};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a pixel position into the angles of the ray through it.
///
/// The vertical field of view is derived from the horizontal one and the aspect ratio. Image rows
/// grow downwards while `angle_y_rad` grows upwards.
pub fn ray_from_pixel(
    pixel_x: f64,
    pixel_y: f64,
    fov_horizontal_rad: f64,
    resolution: Resolution,
) -> CameraRay {
    let width = resolution.width as f64;
    let height = resolution.height as f64;
    let half_hfov = fov_horizontal_rad / 2.0;
    let half_vfov = resolution.aspect() * fov_horizontal_rad / 2.0;

    CameraRay {
        angle_x_rad: lin_map((0.0, width), (-half_hfov, half_hfov), pixel_x),
        angle_y_rad: -lin_map((0.0, height), (-half_vfov, half_vfov), pixel_y),
    }
}

/// Convert ray angles into a unit direction vector in the base frame.
pub fn ray_to_unit_vector(angle_x_rad: f64, angle_y_rad: f64) -> Vector3<f64> {
    Vector3::new(
        angle_x_rad.sin() * angle_y_rad.cos(),
        angle_x_rad.cos() * angle_y_rad.cos(),
        angle_y_rad.sin(),
    )
}

/// Estimate the target location from the left and right camera rays.
///
/// The rays are treated as skew lines `p_i + t_i * d_i`. The closest point on each line is found
/// from the normal equations and the midpoint of the two is returned.
pub fn triangulate(
    left: &CameraRay,
    right: &CameraRay,
    params: &TrackingParams,
) -> Result<Location, TrackingError> {
    let (closest_left, closest_right) = closest_points(left, right, params)?;
    let separation_m = nalgebra::distance(&closest_left, &closest_right);

    trace!(
        "Closest points {:?} and {:?}, {:.4} m apart",
        closest_left,
        closest_right,
        separation_m
    );

    if let Some(max_m) = params.max_ray_separation_m {
        if separation_m > max_m {
            return Err(TrackingError::RaysTooFarApart {
                separation_m,
                max_m,
            });
        }
    }

    Ok(nalgebra::center(&closest_left, &closest_right))
}

/// Direction of the left camera's ray in the base frame.
pub(crate) fn left_direction(ray: &CameraRay, params: &TrackingParams) -> Vector3<f64> {
    ray_to_unit_vector(
        ray.angle_x_rad + params.cam_yaw_rad,
        ray.angle_y_rad + params.cam_pitch_rad,
    )
}

/// Direction of the right camera's ray in the base frame, the yaw is mirrored.
pub(crate) fn right_direction(ray: &CameraRay, params: &TrackingParams) -> Vector3<f64> {
    ray_to_unit_vector(
        ray.angle_x_rad - params.cam_yaw_rad,
        ray.angle_y_rad + params.cam_pitch_rad,
    )
}

/// Horizontal angles of the left and right rays in the base frame, positive towards `+x`.
pub fn base_azimuths(
    left: &CameraRay,
    right: &CameraRay,
    params: &TrackingParams,
) -> (f64, f64) {
    (
        left.angle_x_rad + params.cam_yaw_rad,
        right.angle_x_rad - params.cam_yaw_rad,
    )
}

fn closest_points(
    left: &CameraRay,
    right: &CameraRay,
    params: &TrackingParams,
) -> Result<(Point3<f64>, Point3<f64>), TrackingError> {
    let p1 = point_from_array(&params.left_cam_offset_m);
    let p2 = point_from_array(&params.right_cam_offset_m);
    let d1 = left_direction(left, params);
    let d2 = right_direction(right, params);

    let baseline = p2 - p1;

    let a = d1.dot(&d1);
    let b = d1.dot(&d2);
    let d = d2.dot(&d2);
    let c = baseline.dot(&d1);
    let e = baseline.dot(&d2);

    let denom = a * d - b * b;
    if denom.abs() < params.parallel_epsilon {
        return Err(TrackingError::DegenerateRays(denom));
    }

    let t1 = (c * d - b * e) / denom;
    let t2 = (b * c - a * e) / denom;

    Ok((p1 + d1 * t1, p2 + d2 * t2))
}

fn point_from_array(arr: &[f64; 3]) -> Point3<f64> {
    Point3::new(arr[0], arr[1], arr[2])
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-6;

    /// Build the ray a camera at `cam` would see `target` along, undoing the mount yaw/pitch.
    fn ray_towards(target: &Location, cam: &[f64; 3], yaw_rad: f64, pitch_rad: f64) -> CameraRay {
        let dir = (target - point_from_array(cam)).normalize();
        CameraRay::new(
            dir.x.atan2(dir.y) - yaw_rad,
            dir.z.clamp(-1.0, 1.0).asin() - pitch_rad,
        )
    }

    fn assert_point_near(a: &Location, b: &Location) {
        assert!(
            nalgebra::distance(a, b) < TOL,
            "{:?} is not within {} m of {:?}",
            a,
            TOL,
            b
        );
    }

    #[test]
    fn test_ray_from_pixel() {
        let res = Resolution::new(640, 480);
        let fov = 1.0;

        let centre = ray_from_pixel(320.0, 240.0, fov, res);
        assert!(centre.angle_x_rad.abs() < 1e-12);
        assert!(centre.angle_y_rad.abs() < 1e-12);

        // Top left corner looks left and up
        let corner = ray_from_pixel(0.0, 0.0, fov, res);
        assert!((corner.angle_x_rad + 0.5).abs() < 1e-12);
        assert!((corner.angle_y_rad - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_unit_vector() {
        let v = ray_to_unit_vector(0.3, -0.2);
        assert!((v.norm() - 1.0).abs() < 1e-12);

        let fwd = ray_to_unit_vector(0.0, 0.0);
        assert_eq!(fwd, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangulate_round_trip() {
        let params = TrackingParams::default();
        let target = Location::new(0.15, 0.8, -0.1);

        let left = ray_towards(&target, &params.left_cam_offset_m, 0.0, 0.0);
        let right = ray_towards(&target, &params.right_cam_offset_m, 0.0, 0.0);

        assert_point_near(&triangulate(&left, &right, &params).unwrap(), &target);
    }

    #[test]
    fn test_triangulate_round_trip_with_mount_angles() {
        let params = TrackingParams {
            left_cam_offset_m: [-0.12, 0.02, 0.1],
            right_cam_offset_m: [0.12, 0.02, 0.1],
            cam_yaw_rad: 0.1,
            cam_pitch_rad: -0.05,
            ..Default::default()
        };
        let target = Location::new(-0.3, 1.2, 0.25);

        let left = ray_towards(&target, &params.left_cam_offset_m, 0.1, -0.05);
        let right = ray_towards(&target, &params.right_cam_offset_m, -0.1, -0.05);

        assert_point_near(&triangulate(&left, &right, &params).unwrap(), &target);
    }

    #[test]
    fn test_base_azimuths_undo_mount_yaw() {
        let params = TrackingParams {
            cam_yaw_rad: 0.1,
            ..Default::default()
        };
        // Beyond the point where the toed-in boresights cross
        let target = Location::new(0.0, 3.0, 0.25);

        let left = ray_towards(&target, &params.left_cam_offset_m, 0.1, 0.0);
        let right = ray_towards(&target, &params.right_cam_offset_m, -0.1, 0.0);
        assert!(left.angle_x_rad < right.angle_x_rad);

        let (left_az, right_az) = base_azimuths(&left, &right, &params);
        assert!((left_az - 0.1f64.atan2(3.0)).abs() < 1e-12);
        assert!((right_az + 0.1f64.atan2(3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_triangulate_parallel_rays() {
        let params = TrackingParams::default();
        let ray = CameraRay::new(0.0, 0.0);

        match triangulate(&ray, &ray, &params) {
            Err(TrackingError::DegenerateRays(_)) => (),
            r => panic!("Expected degenerate rays, got {:?}", r),
        }
    }

    #[test]
    fn test_residual_check() {
        // Rays at different elevations never meet
        let left = CameraRay::new(0.1, 0.2);
        let right = CameraRay::new(-0.1, -0.2);

        let mut params = TrackingParams::default();
        assert!(triangulate(&left, &right, &params).is_ok());

        params.max_ray_separation_m = Some(0.1);
        match triangulate(&left, &right, &params) {
            Err(TrackingError::RaysTooFarApart { separation_m, .. }) => {
                assert!(separation_m > 0.1)
            }
            r => panic!("Expected rays too far apart, got {:?}", r),
        }
    }
}
