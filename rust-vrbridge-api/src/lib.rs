#[cfg(feature = "utils")]
extern crate time;

#[cfg(feature = "serde-serialization")]
#[macro_use]
extern crate serde_derive;

pub mod utils;

pub mod mock;
pub mod vr_device_info;
pub mod vr_driver;
pub mod vr_error;
pub mod vr_event;
pub mod vr_eye;
pub mod vr_field_view;
pub mod vr_frame_data;
pub mod vr_framebuffer;
pub mod vr_gamepad;
pub mod vr_layer;
pub mod vr_pose;
pub mod vr_service;
pub mod vr_session;

pub use mock::MockVRControlMsg;
pub use vr_device_info::VRDeviceInfo;
pub use vr_driver::{DriverCapability, DriverKind};
pub use vr_error::{ConfigureError, ConnectError, GpuResourceError, SessionError, SubmitError};
pub use vr_event::VRSessionEvent;
pub use vr_eye::{EyeDescriptor, VREye};
pub use vr_field_view::{Frustum, VRFieldOfView};
pub use vr_frame_data::FrameTrackingSnapshot;
pub use vr_framebuffer::FrameBufferDescriptor;
pub use vr_gamepad::{VRButton, VRControllerInput, VRHand};
pub use vr_layer::{TextureId, TextureTarget, VRLayer};
pub use vr_pose::{TrackedDevicePose, VRPose};
pub use vr_service::DriverSessionCreator;
pub use vr_session::{DriverSession, TextureBridge};
