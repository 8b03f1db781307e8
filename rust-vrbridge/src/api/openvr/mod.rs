mod runtime;
mod session;

pub use self::runtime::{CompositorError, ControllerRole, DeviceClass, FloatProperty, OpenVRControllerState,
                        OpenVREvent, OpenVRRuntime, OpenVRTrackedPose, ProjectionRaw, StringProperty,
                        TextureBounds, HMD_DEVICE_INDEX, MAX_TRACKED_DEVICES};
pub use self::session::{OpenVRSession, OpenVRSessionCreator};
