use crate::config::VRConfig;
use crate::error::VRError;
use crate::framebuffer::FrameBufferBridge;
use crate::gpu::GpuContext;
use crate::utils;
use crate::{ConnectError, DriverCapability, DriverKind, DriverSession, DriverSessionCreator, EyeDescriptor,
            FrameTrackingSnapshot, Frustum, GpuResourceError, TextureId, TrackedDevicePose, VRDeviceInfo, VREye,
            VRFieldOfView, VRLayer, VRPose, VRSessionEvent};
use std::mem;
use std::rc::Rc;
#[cfg(feature = "mock")]
use crate::api::{MockOculusRuntime, MockOpenVRRuntime, OculusSessionCreator, OpenVRSessionCreator};
#[cfg(feature = "mock")]
use crate::runtime_registry::RuntimeRegistry;
#[cfg(feature = "mock")]
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub gpu_context_ready: bool,
    pub driver_connected: bool,
}

/// Host-visible notifications, drained with [`VrController::poll_notifications`].
#[derive(Debug, Clone, PartialEq)]
pub enum VRNotification {
    ConnectionState(bool),
    DeviceInfo(VRDeviceInfo),
    Availability(DriverCapability),
    RecommendedDimensions(u32, u32),
    SessionEvent(VRSessionEvent),
    // The submitted texture, passed through unchanged for downstream consumers.
    Texture { handle: TextureId, width: u32, height: u32 },
    Warning(String),
    Error(VRError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOutput {
    pub eye: VREye,
    pub tracking: VRPose,
    pub world: VRPose,
    pub frustum: Frustum,
}

/// A tracked entity in both spaces. World-space velocities are rotated by the view.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOutput {
    pub tracking: TrackedDevicePose,
    pub world: TrackedDevicePose,
}

impl EntityOutput {
    fn new(tracking: TrackedDevicePose, view: &VRPose) -> EntityOutput {
        let world = tracking.to_world(view);
        EntityOutput {
            tracking: tracking,
            world: world,
        }
    }
}

/// Everything `tick` produces. Eyes are always present; entities only when the
/// active driver reported them.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutputs {
    pub eyes: [EyeOutput; 2],
    pub head: Option<EntityOutput>,
    pub hands: [Option<EntityOutput>; 2],
    pub trackers: Vec<EntityOutput>,
}

/// Orchestrates driver sessions, GPU resources and per-frame output.
///
/// The GPU context and the HMD session come and go independently. The
/// controller keeps two invariants across every call:
///
/// * a session is active exactly when `driver_connected` is set;
/// * the offscreen target exists only while both the GPU context is ready and
///   a driver is connected (it may be created lazily by `submit_texture`).
///
/// Within one frame the host must call [`tick`](VrController::tick) before
/// [`submit_texture`](VrController::submit_texture); submitting first makes the
/// submitted frame use poses one frame stale.
pub struct VrController {
    config: VRConfig,
    creators: Vec<Box<dyn DriverSessionCreator>>,
    capabilities: Vec<DriverCapability>,
    state: ConnectionState,
    active: Option<Box<dyn DriverSession>>,
    bridge: FrameBufferBridge,
    last_known_dims: (u32, u32),
    // Head-relative eye poses from the last configure().
    eye_offsets: Option<[VRPose; 2]>,
    eye_fov: [VRFieldOfView; 2],
    eye_poses: [VRPose; 2],
    view: VRPose,
    device_info: Option<VRDeviceInfo>,
    notifications: Vec<VRNotification>,
}

impl VrController {
    pub fn new(config: VRConfig, gpu: Rc<dyn GpuContext>) -> VrController {
        let fov = config.offline_eyes.field_of_view;
        let eye_poses = [config.offline_eyes.eye_pose(VREye::Left), config.offline_eyes.eye_pose(VREye::Right)];
        VrController {
            last_known_dims: config.default_dimensions,
            config: config,
            creators: Vec::new(),
            capabilities: Vec::new(),
            state: ConnectionState::default(),
            active: None,
            bridge: FrameBufferBridge::new(gpu),
            eye_offsets: None,
            eye_fov: [fov, fov],
            eye_poses: eye_poses,
            view: VRPose::identity(),
            device_info: None,
            notifications: Vec::new(),
        }
    }

    // Register a driver session creator, replacing any previous one for the same backend
    pub fn register(&mut self, creator: Box<dyn DriverSessionCreator>) {
        let kind = creator.kind();
        self.creators.retain(|c| c.kind() != kind);
        self.creators.push(creator);
    }

    // Register mock runtimes for both backends
    // Useful for testing and offline simulation
    #[cfg(feature = "mock")]
    pub fn register_mock(&mut self, registry: Arc<RuntimeRegistry>) -> (MockOculusRuntime, MockOpenVRRuntime) {
        let oculus = MockOculusRuntime::new();
        let openvr = MockOpenVRRuntime::new();
        self.register(OculusSessionCreator::new(oculus.clone(), registry.clone(), self.config.detect_timeout()));
        self.register(OpenVRSessionCreator::new(openvr.clone(), registry));
        (oculus, openvr)
    }

    pub fn config(&self) -> &VRConfig {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.driver_connected
    }

    pub fn active_driver(&self) -> Option<DriverKind> {
        self.active.as_ref().map(|session| session.kind())
    }

    pub fn capabilities(&self) -> &[DriverCapability] {
        &self.capabilities
    }

    pub fn recommended_dimensions(&self) -> (u32, u32) {
        self.last_known_dims
    }

    pub fn device_info(&self) -> Option<&VRDeviceInfo> {
        self.device_info.as_ref()
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.bridge.is_allocated()
    }

    pub fn gpu_resource_dimensions(&self) -> Option<(u32, u32)> {
        self.bridge.dimensions()
    }

    pub fn set_near_clip(&mut self, near: f32) {
        self.config.near_clip = near;
    }

    pub fn set_far_clip(&mut self, far: f32) {
        self.config.far_clip = far;
    }

    pub fn poll_notifications(&mut self) -> Vec<VRNotification> {
        mem::replace(&mut self.notifications, Vec::new())
    }

    pub fn on_context_created(&mut self) {
        self.check_invariant();
        self.state.gpu_context_ready = true;
        if !self.state.driver_connected {
            // try_connect allocates on success.
            self.try_connect();
        } else {
            self.allocate_gpu_resources();
        }
        self.check_invariant();
    }

    pub fn on_context_destroyed(&mut self) {
        self.check_invariant();
        self.disconnect();
        self.state.gpu_context_ready = false;
        self.bridge.release();
        self.check_invariant();
    }

    /// Connects to the preferred backend, falling back to the other one unless
    /// `prefer_only` is set. Returns whether a driver is connected afterwards.
    pub fn try_connect(&mut self) -> bool {
        self.check_invariant();
        if self.active.is_some() {
            return true;
        }

        self.refresh_capabilities();
        let preferred = self.config.preferred_driver;
        let mut order = vec![preferred];
        if !self.config.prefer_only {
            order.push(preferred.other());
        }

        for kind in order {
            let available = self.capabilities.iter().any(|c| c.kind == kind && c.available);
            if !available {
                debug!("Skipping {} driver: not available", kind);
                continue;
            }
            match self.connect_driver(kind) {
                Ok(()) => break,
                Err(e) => self.report(e),
            }
        }

        if !self.state.driver_connected {
            let kinds: Vec<_> = self.capabilities.iter().filter(|c| c.available).map(|c| c.kind).collect();
            warn!("No VR driver connected (available: {:?})", kinds);
        }
        let (width, height) = self.last_known_dims;
        self.notifications.push(VRNotification::ConnectionState(self.state.driver_connected));
        self.notifications.push(VRNotification::RecommendedDimensions(width, height));
        if self.state.driver_connected && self.state.gpu_context_ready {
            self.allocate_gpu_resources();
        }
        self.check_invariant();
        self.state.driver_connected
    }

    pub fn disconnect(&mut self) {
        self.check_invariant();
        if let Some(mut session) = self.active.take() {
            session.disconnect();
            self.state.driver_connected = false;
            self.bridge.release();
            self.device_info = None;
            self.eye_offsets = None;
            self.eye_poses = [self.config.offline_eyes.eye_pose(VREye::Left),
                              self.config.offline_eyes.eye_pose(VREye::Right)];
            let fov = self.config.offline_eyes.field_of_view;
            self.eye_fov = [fov, fov];
            info!("Disconnected from {} driver", session.kind());
            self.notifications.push(VRNotification::ConnectionState(false));
        }
        self.check_invariant();
    }

    /// Stores the preferred backend. Switches backends only when a different
    /// one is currently connected.
    pub fn set_driver_preference(&mut self, name: &str) -> Result<(), VRError> {
        let kind = DriverKind::from_name(name).ok_or_else(|| VRError::UnknownDriver(name.to_owned()))?;
        self.set_preferred_driver(kind);
        Ok(())
    }

    pub fn set_preferred_driver(&mut self, kind: DriverKind) {
        self.config.preferred_driver = kind;
        match self.active_driver() {
            Some(active) if active != kind => {
                info!("Switching from {} to {} driver", active, kind);
                self.disconnect();
                self.try_connect();
            }
            _ => {}
        }
    }

    pub fn set_prefer_only(&mut self, prefer_only: bool) {
        self.config.prefer_only = prefer_only;
    }

    pub fn recenter(&mut self) {
        if let Some(ref mut session) = self.active {
            session.recenter();
        }
    }

    /// Checks every registered backend and reports its availability.
    pub fn refresh_capabilities(&mut self) -> &[DriverCapability] {
        let preferred = self.config.preferred_driver;
        let active = self.active_driver();
        let mut capabilities = Vec::with_capacity(DriverKind::ALL.len());
        for kind in &DriverKind::ALL {
            let available = if active == Some(*kind) {
                true
            } else {
                self.creators
                    .iter()
                    .find(|c| c.kind() == *kind)
                    .map_or(false, |c| c.new_session().check_availability())
            };
            capabilities.push(DriverCapability {
                kind: *kind,
                available: available,
                preferred: *kind == preferred,
            });
        }
        for capability in &capabilities {
            self.notifications.push(VRNotification::Availability(*capability));
        }
        self.capabilities = capabilities;
        &self.capabilities
    }

    /// Re-emits availability, dimensions and device info.
    pub fn info(&mut self) {
        self.refresh_capabilities();
        let (width, height) = self.last_known_dims;
        self.notifications.push(VRNotification::RecommendedDimensions(width, height));
        if let Some(ref info) = self.device_info {
            self.notifications.push(VRNotification::DeviceInfo(info.clone()));
        }
    }

    /// The per-frame call. Never fails: driver errors disconnect and are reported.
    pub fn tick(&mut self, view: VRPose) -> FrameOutputs {
        self.check_invariant();
        self.view = view;

        let polled = self.active.as_mut().map(|session| session.poll_frame());
        let snapshot = match polled {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(e)) => {
                error!("Lost VR session: {}", e);
                self.report(e.into());
                self.disconnect();
                None
            }
            None => None,
        };

        if let Some(ref snapshot) = snapshot {
            self.handle_session_events(&snapshot.events);
            self.update_eye_poses(snapshot);
        }

        let outputs = self.frame_outputs(snapshot);
        self.check_invariant();
        outputs
    }

    /// Submits the host's rendered texture to the HMD when connected, then
    /// always passes it through to the host.
    pub fn submit_texture(&mut self, handle: TextureId, width: u32, height: u32) -> Result<(), VRError> {
        self.submit_layer(VRLayer::new(handle, width, height))
    }

    /// Like [`submit_texture`](VrController::submit_texture), for a texture
    /// with its own target or per-eye bounds.
    pub fn submit_layer(&mut self, layer: VRLayer) -> Result<(), VRError> {
        self.check_invariant();
        let result = if self.active.is_some() {
            self.submit_to_driver(&layer)
        } else {
            Ok(())
        };
        if let Err(ref e) = result {
            self.report(e.clone());
        }
        self.notifications.push(VRNotification::Texture {
            handle: layer.texture_id,
            width: layer.texture_size.0,
            height: layer.texture_size.1,
        });
        self.check_invariant();
        result
    }
}

impl VrController {
    fn check_invariant(&self) {
        debug_assert_eq!(self.active.is_some(), self.state.driver_connected,
                         "active session and connection flag disagree");
        debug_assert!(!self.bridge.is_allocated() || (self.state.gpu_context_ready && self.state.driver_connected),
                      "GPU resources outlived the context or the session");
    }

    pub(crate) fn notify(&mut self, notification: VRNotification) {
        self.notifications.push(notification);
    }

    fn report(&mut self, error: VRError) {
        error!("{}", error);
        self.notifications.push(VRNotification::Error(error));
    }

    fn connect_driver(&mut self, kind: DriverKind) -> Result<(), VRError> {
        let mut session = match self.creators.iter().find(|c| c.kind() == kind) {
            Some(creator) => creator.new_session(),
            None => return Err(ConnectError::Unavailable.into()),
        };
        debug!("Connecting to {} driver", kind);
        let info = session.connect()?;
        let descriptor = match session.configure() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                session.disconnect();
                return Err(ConnectError::Configure(e).into());
            }
        };

        info!("Connected to {} driver: {} ({}x{})", kind, info.name, descriptor.width, descriptor.height);
        self.apply_eye_configuration(&descriptor.eyes);
        self.last_known_dims = (descriptor.width, descriptor.height);
        self.active = Some(session);
        self.state.driver_connected = true;
        self.device_info = Some(info.clone());
        self.notifications.push(VRNotification::DeviceInfo(info));
        Ok(())
    }

    fn apply_eye_configuration(&mut self, eyes: &[EyeDescriptor; 2]) {
        self.eye_offsets = Some([eyes[0].pose, eyes[1].pose]);
        self.eye_fov = [eyes[0].field_of_view, eyes[1].field_of_view];
    }

    fn allocate_gpu_resources(&mut self) {
        if !(self.state.gpu_context_ready && self.state.driver_connected) {
            return;
        }
        let (width, height) = self.last_known_dims;
        if let Err(e) = self.bridge.allocate(width, height) {
            self.report(e.into());
        }
    }

    fn handle_session_events(&mut self, events: &[VRSessionEvent]) {
        for event in events {
            self.notifications.push(VRNotification::SessionEvent(*event));
            if *event == VRSessionEvent::ConfigurationChanged {
                self.reconfigure();
            }
        }
    }

    // Eye offsets or render size changed while connected.
    fn reconfigure(&mut self) {
        let configured = match self.active {
            Some(ref mut session) => session.configure(),
            None => return,
        };
        match configured {
            Ok(descriptor) => {
                self.apply_eye_configuration(&descriptor.eyes);
                let dims = (descriptor.width, descriptor.height);
                if dims != self.last_known_dims {
                    self.last_known_dims = dims;
                    self.notifications.push(VRNotification::RecommendedDimensions(dims.0, dims.1));
                    if self.bridge.is_allocated() {
                        self.allocate_gpu_resources();
                    }
                }
            }
            Err(e) => {
                self.report(e.into());
                self.disconnect();
            }
        }
    }

    fn update_eye_poses(&mut self, snapshot: &FrameTrackingSnapshot) {
        if let Some(ref eyes) = snapshot.eyes {
            self.eye_poses = [eyes[0].pose, eyes[1].pose];
            self.eye_fov = [eyes[0].field_of_view, eyes[1].field_of_view];
        } else if let (Some(offsets), Some(head)) = (self.eye_offsets.as_ref(), snapshot.head.as_ref()) {
            let head = &head.pose;
            self.eye_poses = [utils::compose(head, &offsets[0]), utils::compose(head, &offsets[1])];
        }
    }

    fn frame_outputs(&self, snapshot: Option<FrameTrackingSnapshot>) -> FrameOutputs {
        let view = &self.view;
        let eye = |eye: VREye| {
            let i = eye.index();
            EyeOutput {
                eye: eye,
                tracking: self.eye_poses[i],
                world: utils::compose(view, &self.eye_poses[i]),
                frustum: self.eye_fov[i].frustum(self.config.near_clip, self.config.far_clip),
            }
        };
        let eyes = [eye(VREye::Left), eye(VREye::Right)];

        match snapshot {
            Some(snapshot) => {
                let [left, right] = snapshot.hands;
                FrameOutputs {
                    eyes: eyes,
                    head: snapshot.head.map(|h| EntityOutput::new(h, view)),
                    hands: [left.map(|h| EntityOutput::new(h, view)), right.map(|h| EntityOutput::new(h, view))],
                    trackers: snapshot.trackers.into_iter().map(|t| EntityOutput::new(t, view)).collect(),
                }
            }
            None => FrameOutputs {
                eyes: eyes,
                head: None,
                hands: [None, None],
                trackers: Vec::new(),
            },
        }
    }

    fn submit_to_driver(&mut self, layer: &VRLayer) -> Result<(), VRError> {
        if !self.state.gpu_context_ready {
            return Err(GpuResourceError::NoContext.into());
        }
        let (target_width, target_height) = self.last_known_dims;
        self.bridge.allocate(target_width, target_height)?;

        let submitted = match self.active {
            Some(ref mut session) => session.submit_frame(&mut self.bridge, layer),
            None => return Ok(()),
        };
        match submitted {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_fatal() {
                    error!("Lost VR session while submitting: {}", e);
                    self.disconnect();
                }
                Err(e.into())
            }
        }
    }
}

impl Drop for VrController {
    fn drop(&mut self) {
        self.disconnect();
        self.bridge.release();
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::api::MockGpuContext;
    use crate::MockVRControlMsg;

    fn controller() -> (VrController, MockOculusRuntime, MockOpenVRRuntime, Rc<MockGpuContext>) {
        let gpu = Rc::new(MockGpuContext::new());
        let mut controller = VrController::new(VRConfig::default(), gpu.clone());
        let (oculus, openvr) = controller.register_mock(RuntimeRegistry::new());
        (controller, oculus, openvr, gpu)
    }

    #[test]
    fn starts_disconnected_without_context() {
        let (controller, ..) = controller();
        assert_eq!(controller.connection_state(), ConnectionState::default());
        assert_eq!(controller.recommended_dimensions(), (1920, 1080));
        assert!(!controller.has_gpu_resources());
    }

    #[test]
    fn connect_prefers_oculus_by_default() {
        let (mut controller, ..) = controller();
        assert!(controller.try_connect());
        assert_eq!(controller.active_driver(), Some(DriverKind::Oculus));
        assert_eq!(controller.recommended_dimensions(), (2364, 1461));
    }

    #[test]
    fn unknown_driver_name_is_rejected() {
        let (mut controller, ..) = controller();
        assert_eq!(controller.set_driver_preference("cardboard"),
                   Err(VRError::UnknownDriver("cardboard".into())));
        assert_eq!(controller.config().preferred_driver, DriverKind::Oculus);
    }

    #[test]
    fn preference_does_not_connect_when_disconnected() {
        let (mut controller, ..) = controller();
        controller.set_driver_preference("vive").unwrap();
        assert!(!controller.is_connected());
        assert_eq!(controller.config().preferred_driver, DriverKind::OpenVR);
    }

    #[test]
    fn preference_switches_active_backend() {
        let (mut controller, oculus, ..) = controller();
        controller.try_connect();
        controller.set_driver_preference("steamvr").unwrap();
        assert_eq!(controller.active_driver(), Some(DriverKind::OpenVR));
        assert_eq!(oculus.state().live_sessions, 0);
    }

    #[test]
    fn configuration_change_updates_dimensions() {
        let (mut controller, _, openvr, _) = controller();
        controller.set_preferred_driver(DriverKind::OpenVR);
        controller.try_connect();
        assert_eq!(controller.recommended_dimensions(), (3024, 1680));
        controller.poll_notifications();

        openvr.handle_msg(MockVRControlMsg::SetRecommendedSize(1000, 900));
        openvr.handle_msg(MockVRControlMsg::SetIpd(0.07));
        controller.tick(VRPose::identity());
        assert_eq!(controller.recommended_dimensions(), (2000, 900));
        let notifications = controller.poll_notifications();
        assert!(notifications.contains(&VRNotification::SessionEvent(VRSessionEvent::ConfigurationChanged)));
        assert!(notifications.contains(&VRNotification::RecommendedDimensions(2000, 900)));
    }

    #[test]
    fn submit_while_disconnected_passes_texture_through() {
        let (mut controller, ..) = controller();
        assert!(controller.submit_texture(5, 640, 480).is_ok());
        assert_eq!(controller.poll_notifications(),
                   vec![VRNotification::Texture { handle: 5, width: 640, height: 480 }]);
    }

    #[test]
    fn submit_without_context_is_reported() {
        let (mut controller, ..) = controller();
        controller.try_connect();
        controller.poll_notifications();
        let result = controller.submit_texture(5, 640, 480);
        assert_eq!(result, Err(VRError::Gpu(GpuResourceError::NoContext)));
        assert!(controller.is_connected());
        let notifications = controller.poll_notifications();
        assert_eq!(notifications.last(), Some(&VRNotification::Texture { handle: 5, width: 640, height: 480 }));
    }
}
