use crate::{ConfigureError, ConnectError, DriverKind, FrameBufferDescriptor, FrameTrackingSnapshot,
            GpuResourceError, SessionError, SubmitError, TextureId, VRDeviceInfo, VRLayer};

/// A connection to one vendor runtime.
///
/// Sessions move between two states only: disconnected and connected.
/// `connect` is synchronous and always reaches one of them; a failed connect
/// leaves no native resource behind. While connected the session exclusively
/// owns its runtime handles and any swap chains it created.
pub trait DriverSession {
    fn kind(&self) -> DriverKind;

    /// Reports whether the runtime and an HMD are present. Bounded in time and
    /// does not change the session state.
    fn check_availability(&mut self) -> bool;

    /// Idempotent: connecting a connected session returns the same device info.
    fn connect(&mut self) -> Result<VRDeviceInfo, ConnectError>;

    /// Releases the native session. No-op when already disconnected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn configure(&mut self) -> Result<FrameBufferDescriptor, ConfigureError>;

    /// Predicted tracking for the next displayed frame. Any error ends the session.
    fn poll_frame(&mut self) -> Result<FrameTrackingSnapshot, SessionError>;

    fn submit_frame(&mut self, bridge: &mut dyn TextureBridge, layer: &VRLayer) -> Result<(), SubmitError>;

    /// Resets the seated origin to the current head pose.
    fn recenter(&mut self);
}

/// The GPU side a session draws on while submitting: the offscreen target
/// owned by the controller and a filtered texture copy.
pub trait TextureBridge {
    /// Color texture of the offscreen target and its size.
    fn local_texture(&self) -> Result<(TextureId, u32, u32), GpuResourceError>;

    /// Scales `source` into `destination`, overwriting all of it.
    fn copy_in(&mut self,
               source: &VRLayer,
               destination: TextureId,
               size: (u32, u32),
               flip_vertical: bool)
               -> Result<(), GpuResourceError>;
}
