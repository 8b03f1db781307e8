//! The slice of the LibOVR (PC SDK) API the session uses.

use crate::{TextureId, TrackedDevicePose, VREye, VRPose};
use std::time::Duration;
use thiserror::Error;

/// `ovrSession`
pub type OvrSession = u64;
/// `ovrTextureSwapChain`
pub type OvrSwapChain = u64;

/// Failure `ovrResult`s the session distinguishes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OvrError {
    #[error("ovrError_DisplayLost")]
    DisplayLost,
    #[error("ovrError_ServiceConnection")]
    ServiceConnection,
    #[error("ovrError_NoHmd")]
    NoHmd,
    #[error("{0}")]
    Failure(String),
}

/// `ovrFovPort`: positive tangents of the four half-angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OvrHmdDesc {
    pub product_name: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub firmware_major: i16,
    pub firmware_minor: i16,
    pub resolution: (u32, u32),
    pub display_refresh_rate: f32,
    pub default_eye_fov: [FovPort; 2],
}

/// `ovrEyeRenderDesc`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvrEyeRenderDesc {
    pub fov: FovPort,
    pub hmd_to_eye_pose: VRPose,
}

/// `ovrSessionStatus`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrSessionStatus {
    pub is_visible: bool,
    pub hmd_present: bool,
    pub hmd_mounted: bool,
    pub display_lost: bool,
    pub should_quit: bool,
    pub should_recenter: bool,
    pub has_input_focus: bool,
}

/// `ovrTrackingState` at the requested absolute time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OvrTrackingState {
    // None until the sensors report orientation tracking.
    pub head: Option<TrackedDevicePose>,
    // Indexed by ovrHand_Left / ovrHand_Right. None when not tracked.
    pub hands: [Option<TrackedDevicePose>; 2],
}

/// `ovrInputState` for the Touch controllers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrInputState {
    pub buttons: u32,
    pub touches: u32,
    pub index_trigger: [f32; 2],
    pub hand_trigger: [f32; 2],
    pub thumbstick: [[f32; 2]; 2],
}

// ovrButton_* / ovrTouch_* masks
pub const BUTTON_A: u32 = 0x0000_0001;
pub const BUTTON_B: u32 = 0x0000_0002;
pub const BUTTON_RTHUMB: u32 = 0x0000_0004;
pub const BUTTON_X: u32 = 0x0000_0100;
pub const BUTTON_Y: u32 = 0x0000_0200;
pub const BUTTON_LTHUMB: u32 = 0x0000_0400;
pub const BUTTON_ENTER: u32 = 0x0010_0000;
pub const TOUCH_RINDEX_TRIGGER: u32 = 0x0000_0010;
pub const TOUCH_LINDEX_TRIGGER: u32 = 0x0000_1000;

/// Viewport of one eye inside the submitted swap chain texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvrRecti {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// `ovrLayerEyeFov`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvrLayerEyeFov {
    pub color_texture: OvrSwapChain,
    pub viewports: [OvrRecti; 2],
    pub fov: [FovPort; 2],
    // Eye poses the frame was rendered with, in tracking space.
    pub render_poses: [VRPose; 2],
    pub sensor_sample_time: f64,
}

pub trait OculusRuntime {
    /// `ovr_Detect`: service running and HMD connected, waiting at most `timeout`.
    fn detect(&self, timeout: Duration) -> bool;

    fn initialize(&self) -> Result<(), OvrError>;

    fn shutdown(&self);

    fn create_session(&self) -> Result<OvrSession, OvrError>;

    fn destroy_session(&self, session: OvrSession);

    fn hmd_desc(&self, session: OvrSession) -> OvrHmdDesc;

    fn fov_texture_size(&self, session: OvrSession, eye: VREye, fov: FovPort) -> (u32, u32);

    fn eye_render_desc(&self, session: OvrSession, eye: VREye, fov: FovPort) -> OvrEyeRenderDesc;

    fn session_status(&self, session: OvrSession) -> Result<OvrSessionStatus, OvrError>;

    fn recenter_tracking_origin(&self, session: OvrSession);

    /// Seconds, runtime clock.
    fn predicted_display_time(&self, session: OvrSession, frame_index: u64) -> f64;

    fn tracking_state(&self, session: OvrSession, abs_time: f64) -> OvrTrackingState;

    /// None when no Touch controllers are connected.
    fn input_state(&self, session: OvrSession) -> Option<OvrInputState>;

    fn create_swap_chain(&self, session: OvrSession, width: u32, height: u32) -> Result<OvrSwapChain, OvrError>;

    fn destroy_swap_chain(&self, session: OvrSession, chain: OvrSwapChain);

    /// GL name of the swap chain texture at the current index.
    fn swap_chain_texture(&self, session: OvrSession, chain: OvrSwapChain) -> Result<TextureId, OvrError>;

    fn commit_swap_chain(&self, session: OvrSession, chain: OvrSwapChain) -> Result<(), OvrError>;

    fn submit_frame(&self, session: OvrSession, frame_index: u64, layer: &OvrLayerEyeFov) -> Result<(), OvrError>;
}
