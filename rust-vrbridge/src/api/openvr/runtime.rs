//! The slice of the OpenVR `IVRSystem` / `IVRCompositor` API the session uses.

use crate::{TextureId, VREye};

pub const MAX_TRACKED_DEVICES: usize = 64;
pub const HMD_DEVICE_INDEX: u32 = 0;

/// Mirrors `TrackedDevicePose_t`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpenVRTrackedPose {
    // Row-major 3x4 device-to-tracking transform.
    pub device_to_absolute: [[f32; 4]; 3],
    pub velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

/// Raw projection in tangent units, as returned by `GetProjectionRaw`.
/// `left` and `top` are negative for a conventional frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRaw {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Invalid,
    Hmd,
    Controller,
    GenericTracker,
    TrackingReference,
    DisplayRedirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerRole {
    Invalid,
    LeftHand,
    RightHand,
}

/// Mirrors `VRControllerState_t`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpenVRControllerState {
    pub packet_num: u32,
    pub button_pressed: u64,
    pub button_touched: u64,
    // rAxis[0] is the trackpad, rAxis[1] the trigger (x only).
    pub axis: [[f32; 2]; 5],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringProperty {
    TrackingSystemName,
    ModelNumber,
    SerialNumber,
    ManufacturerName,
    FirmwareVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatProperty {
    DisplayFrequency,
    UserIpdMeters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenVREvent {
    Quit,
    TrackedDeviceActivated(u32),
    TrackedDeviceDeactivated(u32),
    TrackedDeviceUserInteractionStarted(u32),
    TrackedDeviceUserInteractionEnded(u32),
    IpdChanged,
    ChaperoneDataHasChanged,
    DashboardActivated,
    DashboardDeactivated,
    SeatedZeroPoseReset,
    Other(u32),
}

/// `VRTextureBounds_t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBounds {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl TextureBounds {
    // Layers carry (uMin, vMin, uWidth, vHeight).
    pub fn from_layer_bounds(bounds: &[f32; 4]) -> TextureBounds {
        TextureBounds {
            u_min: bounds[0],
            v_min: bounds[1],
            u_max: bounds[0] + bounds[2],
            v_max: bounds[1] + bounds[3],
        }
    }
}

/// `EVRCompositorError`, minus `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorError {
    RequestFailed,
    IncompatibleVersion,
    DoNotHaveFocus,
    InvalidTexture,
    IsNotSceneApplication,
    TextureIsOnWrongDevice,
    TextureUsesUnsupportedFormat,
    SharedTexturesNotSupported,
    IndexOutOfRange,
    AlreadySubmitted,
}

pub trait OpenVRRuntime {
    fn is_runtime_installed(&self) -> bool;

    fn is_hmd_present(&self) -> bool;

    /// `VR_Init` as a scene application. Returns the init error on failure.
    fn init(&self) -> Result<(), String>;

    fn shutdown(&self);

    /// Fetches the compositor interface and selects the seated tracking universe.
    fn compositor_available(&self) -> bool;

    fn recommended_render_target_size(&self) -> (u32, u32);

    fn projection_raw(&self, eye: VREye) -> ProjectionRaw;

    fn eye_to_head_transform(&self, eye: VREye) -> [[f32; 4]; 3];

    fn string_property(&self, index: u32, property: StringProperty) -> Option<String>;

    fn float_property(&self, index: u32, property: FloatProperty) -> Option<f32>;

    /// Blocks until the compositor is ready for the next frame and fills `poses`
    /// with poses predicted for it.
    fn wait_get_poses(&self, poses: &mut [OpenVRTrackedPose]) -> Result<(), CompositorError>;

    fn device_class(&self, index: u32) -> DeviceClass;

    fn controller_role(&self, index: u32) -> ControllerRole;

    fn controller_state(&self, index: u32) -> Option<OpenVRControllerState>;

    fn poll_next_event(&self) -> Option<OpenVREvent>;

    fn submit(&self, eye: VREye, texture: TextureId, bounds: &TextureBounds) -> Result<(), CompositorError>;

    fn post_present_handoff(&self);

    fn reset_seated_zero_pose(&self);
}
