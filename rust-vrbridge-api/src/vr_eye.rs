use crate::{VRFieldOfView, VRPose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum VREye {
    Left,
    Right,
}

impl VREye {
    pub const BOTH: [VREye; 2] = [VREye::Left, VREye::Right];

    pub fn index(&self) -> usize {
        match *self {
            VREye::Left => 0,
            VREye::Right => 1,
        }
    }
}

// All the information required to render a scene for a given eye.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct EyeDescriptor {
    pub eye: VREye,

    // Eye pose. Relative to the head when returned by configure(),
    // in tracking space when returned by poll_frame().
    pub pose: VRPose,

    pub field_of_view: VRFieldOfView,
}

impl EyeDescriptor {
    pub fn new(eye: VREye, pose: VRPose, field_of_view: VRFieldOfView) -> EyeDescriptor {
        EyeDescriptor {
            eye: eye,
            pose: pose,
            field_of_view: field_of_view,
        }
    }
}
