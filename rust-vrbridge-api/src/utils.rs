//! Pose math shared by the backends and the controller.
//!
//! Convention: right-handed, +Y up, -Z forward, meters. Quaternions are
//! `[x, y, z, w]`. A world-space pose is the tracking-space pose composed
//! with the host view transform: `world = view ∘ tracking`.

use euclid::{RigidTransform3D, Rotation3D, Vector3D};
use crate::VRPose;

/// Frame of a single tracked entity (head, hand, eye).
pub enum LocalSpace {}
/// The backend's tracking origin.
pub enum TrackingSpace {}
/// The host application's frame.
pub enum WorldSpace {}

// Returns the current time in milliseconds
#[cfg(feature = "utils")]
#[allow(dead_code)]
pub fn timestamp() -> f64 {
    let timespec = time::get_time();
    timespec.sec as f64 * 1000.0 + (timespec.nsec as f64 * 1e-6)
}

#[cfg(not(feature = "utils"))]
#[allow(dead_code)]
pub fn timestamp() -> f64 {
    0.0
}

/// Returns `q` scaled to unit length, or the identity for a degenerate input.
pub fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if !norm.is_finite() || norm < 1e-6 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    [q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm]
}

pub fn quat_to_wxyz(q: [f32; 4]) -> [f32; 4] {
    [q[3], q[0], q[1], q[2]]
}

pub fn quat_from_wxyz(q: [f32; 4]) -> [f32; 4] {
    [q[1], q[2], q[3], q[0]]
}

pub fn conjugate_quat(q: [f32; 4]) -> [f32; 4] {
    [-q[0], -q[1], -q[2], q[3]]
}

/// Rotates `v` by the quaternion `q`.
pub fn rotate_vector(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let r: Rotation3D<f32, LocalSpace, WorldSpace> = rotation(q);
    let out = r.transform_vector3d(Vector3D::new(v[0], v[1], v[2]));
    [out.x, out.y, out.z]
}

/// Composes a tracking-space pose with the view transform, yielding the world-space pose.
pub fn compose(view: &VRPose, pose: &VRPose) -> VRPose {
    let local: RigidTransform3D<f32, LocalSpace, TrackingSpace> = pose.to_transform();
    let view: RigidTransform3D<f32, TrackingSpace, WorldSpace> = view.to_transform();
    VRPose::from_transform(&local.then(&view))
}

/// Decomposes a row-major 3x4 rigid transform (rotation | translation), the
/// layout OpenVR uses for device-to-tracking matrices.
pub fn matrix34_to_pose(m: &[[f32; 4]; 3]) -> VRPose {
    VRPose {
        position: [m[0][3], m[1][3], m[2][3]],
        orientation: matrix_to_quat(m),
    }
}

/// Builds the row-major 3x4 matrix for a pose.
pub fn pose_to_matrix34(pose: &VRPose) -> [[f32; 4]; 3] {
    let [x, y, z, w] = normalize_quat(pose.orientation);
    let p = pose.position;
    [[1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - z * w), 2.0 * (x * z + y * w), p[0]],
     [2.0 * (x * y + z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - x * w), p[1]],
     [2.0 * (x * z - y * w), 2.0 * (y * z + x * w), 1.0 - 2.0 * (x * x + y * y), p[2]]]
}

// Adapted from http://www.euclideanspace.com/maths/geometry/rotations/conversions/matrixToQuaternion/index.htm
// Picks the largest diagonal term so 180 degree rotations keep their sign.
pub fn matrix_to_quat(m: &[[f32; 4]; 3]) -> [f32; 4] {
    let trace = m[0][0] + m[1][1] + m[2][2];
    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [(m[2][1] - m[1][2]) / s,
         (m[0][2] - m[2][0]) / s,
         (m[1][0] - m[0][1]) / s,
         0.25 * s]
    } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
        let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
        [0.25 * s,
         (m[0][1] + m[1][0]) / s,
         (m[0][2] + m[2][0]) / s,
         (m[2][1] - m[1][2]) / s]
    } else if m[1][1] > m[2][2] {
        let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
        [(m[0][1] + m[1][0]) / s,
         0.25 * s,
         (m[1][2] + m[2][1]) / s,
         (m[0][2] - m[2][0]) / s]
    } else {
        let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
        [(m[0][2] + m[2][0]) / s,
         (m[1][2] + m[2][1]) / s,
         0.25 * s,
         (m[1][0] - m[0][1]) / s]
    };
    normalize_quat(q)
}

fn rotation<Src, Dst>(q: [f32; 4]) -> Rotation3D<f32, Src, Dst> {
    let q = normalize_quat(q);
    Rotation3D::quaternion(q[0], q[1], q[2], q[3])
}
