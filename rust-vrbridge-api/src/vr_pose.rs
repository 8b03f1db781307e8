use euclid::{RigidTransform3D, Rotation3D, Vector3D};
use crate::utils;
use crate::VRControllerInput;

/// Position and orientation of a tracked entity.
///
/// Position is in meters, orientation is a unit quaternion stored as `[x, y, z, w]`.
/// Both are always produced together for the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRPose {
    pub position: [f32; 3],
    pub orientation: [f32; 4],
}

impl Default for VRPose {
    fn default() -> VRPose {
        VRPose::identity()
    }
}

impl VRPose {
    pub fn new(position: [f32; 3], orientation: [f32; 4]) -> VRPose {
        VRPose {
            position: position,
            orientation: utils::normalize_quat(orientation),
        }
    }

    pub fn identity() -> VRPose {
        VRPose {
            position: [0.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn from_position(position: [f32; 3]) -> VRPose {
        VRPose {
            position: position,
            ..VRPose::identity()
        }
    }

    pub fn to_transform<Src, Dst>(&self) -> RigidTransform3D<f32, Src, Dst> {
        let q = utils::normalize_quat(self.orientation);
        let rotation = Rotation3D::quaternion(q[0], q[1], q[2], q[3]);
        let p = self.position;
        RigidTransform3D::new(rotation, Vector3D::new(p[0], p[1], p[2]))
    }

    pub fn from_transform<Src, Dst>(transform: &RigidTransform3D<f32, Src, Dst>) -> VRPose {
        let r = &transform.rotation;
        let t = &transform.translation;
        VRPose {
            position: [t.x, t.y, t.z],
            orientation: utils::normalize_quat([r.i, r.j, r.k, r.r]),
        }
    }
}

/// Pose of a tracked device together with the optional data a backend may
/// report for it. Absent fields are `None`, never zero-filled.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct TrackedDevicePose {
    pub pose: VRPose,

    // Linear velocity in meters per second, in the same space as `pose`.
    pub linear_velocity: Option<[f32; 3]>,

    // Angular velocity in radians per second, in the same space as `pose`.
    pub angular_velocity: Option<[f32; 3]>,

    pub input: Option<VRControllerInput>,
}

impl TrackedDevicePose {
    pub fn new(pose: VRPose) -> TrackedDevicePose {
        TrackedDevicePose {
            pose: pose,
            ..TrackedDevicePose::default()
        }
    }

    /// Re-expresses this device pose in world space.
    pub fn to_world(&self, view: &VRPose) -> TrackedDevicePose {
        TrackedDevicePose {
            pose: utils::compose(view, &self.pose),
            linear_velocity: self.linear_velocity.map(|v| utils::rotate_vector(view.orientation, v)),
            angular_velocity: self.angular_velocity.map(|v| utils::rotate_vector(view.orientation, v)),
            input: self.input.clone(),
        }
    }
}
