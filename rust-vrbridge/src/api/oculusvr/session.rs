use super::runtime::*;
use crate::runtime_registry::{RuntimeLease, RuntimeRegistry};
use crate::utils;
use crate::{ConfigureError, ConnectError, DriverKind, DriverSession, DriverSessionCreator, EyeDescriptor,
            FrameBufferDescriptor, FrameTrackingSnapshot, SessionError, SubmitError, TextureBridge,
            VRButton, VRControllerInput, VRDeviceInfo, VREye, VRFieldOfView, VRLayer, VRPose,
            VRSessionEvent};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_millis(250);

pub struct OculusSessionCreator<R> {
    runtime: R,
    registry: Arc<RuntimeRegistry>,
    detect_timeout: Duration,
}

impl<R: OculusRuntime + Clone + 'static> OculusSessionCreator<R> {
    pub fn new(runtime: R, registry: Arc<RuntimeRegistry>, detect_timeout: Duration) -> Box<dyn DriverSessionCreator> {
        Box::new(OculusSessionCreator {
            runtime: runtime,
            registry: registry,
            detect_timeout: detect_timeout,
        })
    }
}

impl<R: OculusRuntime + Clone + 'static> DriverSessionCreator for OculusSessionCreator<R> {
    fn kind(&self) -> DriverKind {
        DriverKind::Oculus
    }

    fn new_session(&self) -> Box<dyn DriverSession> {
        let mut session = OculusSession::new(self.runtime.clone(), self.registry.clone());
        session.set_detect_timeout(self.detect_timeout);
        Box::new(session)
    }
}

// Per-configuration eye setup, kept for poll and submit.
#[derive(Clone, Copy)]
struct EyeSetup {
    descriptor: FrameBufferDescriptor,
    fov: [FovPort; 2],
    hmd_to_eye: [VRPose; 2],
    viewports: [OvrRecti; 2],
}

// Oculus PC SDK driver session
pub struct OculusSession<R: OculusRuntime> {
    runtime: R,
    registry: Arc<RuntimeRegistry>,
    detect_timeout: Duration,
    lease: Option<RuntimeLease>,
    session: Option<OvrSession>,
    hmd: Option<OvrHmdDesc>,
    device_info: Option<VRDeviceInfo>,
    setup: Option<EyeSetup>,
    swap_chain: Option<OvrSwapChain>,
    frame_index: u64,
    sensor_sample_time: f64,
    render_poses: [VRPose; 2],
    mounted: Option<bool>,
    focused: Option<bool>,
}

impl<R: OculusRuntime> OculusSession<R> {
    pub fn new(runtime: R, registry: Arc<RuntimeRegistry>) -> OculusSession<R> {
        OculusSession {
            runtime: runtime,
            registry: registry,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
            lease: None,
            session: None,
            hmd: None,
            device_info: None,
            setup: None,
            swap_chain: None,
            frame_index: 0,
            sensor_sample_time: 0.0,
            render_poses: [VRPose::identity(); 2],
            mounted: None,
            focused: None,
        }
    }

    pub fn set_detect_timeout(&mut self, timeout: Duration) {
        self.detect_timeout = timeout;
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn destroy_swap_chain(&mut self) {
        if let (Some(session), Some(chain)) = (self.session, self.swap_chain.take()) {
            self.runtime.destroy_swap_chain(session, chain);
        }
    }

    fn session_events(&mut self, session: OvrSession, events: &mut Vec<VRSessionEvent>) -> Result<(), SessionError> {
        let status = self.runtime.session_status(session).map_err(session_error)?;
        if status.should_quit {
            return Err(SessionError::ShouldQuit);
        }
        if status.display_lost {
            return Err(SessionError::DisplayLost);
        }
        if !status.hmd_present {
            return Err(SessionError::DeviceRemoved);
        }

        if status.should_recenter {
            self.runtime.recenter_tracking_origin(session);
            events.push(VRSessionEvent::Recentered);
        }

        if self.mounted != Some(status.hmd_mounted) {
            // The first status only establishes the baseline.
            if self.mounted.is_some() {
                events.push(if status.hmd_mounted { VRSessionEvent::Mounted } else { VRSessionEvent::Unmounted });
            }
            self.mounted = Some(status.hmd_mounted);
        }

        let focused = status.is_visible && status.has_input_focus;
        if self.focused != Some(focused) {
            if self.focused.is_some() {
                events.push(if focused { VRSessionEvent::Focus } else { VRSessionEvent::Blur });
            }
            self.focused = Some(focused);
        }
        Ok(())
    }
}

impl<R: OculusRuntime> DriverSession for OculusSession<R> {
    fn kind(&self) -> DriverKind {
        DriverKind::Oculus
    }

    fn check_availability(&mut self) -> bool {
        self.runtime.detect(self.detect_timeout)
    }

    fn connect(&mut self) -> Result<VRDeviceInfo, ConnectError> {
        if let Some(ref info) = self.device_info {
            return Ok(info.clone());
        }

        let runtime = &self.runtime;
        let lease = self.registry
            .acquire(DriverKind::Oculus, || runtime.initialize())
            .map_err(runtime_error)?;

        let session = match runtime.create_session() {
            Ok(session) => session,
            Err(e) => {
                error!("ovr_Create failed: {}", e);
                lease.release(|| runtime.shutdown());
                return Err(runtime_error(e));
            }
        };

        let hmd = runtime.hmd_desc(session);
        let mut info = VRDeviceInfo::new(DriverKind::Oculus);
        info.name = hmd.product_name.clone();
        info.serial = hmd.serial_number.clone();
        info.firmware = format!("{}.{}", hmd.firmware_major, hmd.firmware_minor);
        info.render_width = hmd.resolution.0;
        info.render_height = hmd.resolution.1;
        info.refresh_rate = Some(hmd.display_refresh_rate);
        info!("Oculus session started on {} ({})", info.name, info.serial);

        self.lease = Some(lease);
        self.session = Some(session);
        self.hmd = Some(hmd);
        self.device_info = Some(info.clone());
        self.mounted = None;
        self.focused = None;
        Ok(info)
    }

    fn disconnect(&mut self) {
        self.destroy_swap_chain();
        self.setup = None;
        self.hmd = None;
        self.device_info = None;
        if let Some(session) = self.session.take() {
            self.runtime.destroy_session(session);
        }
        if let Some(lease) = self.lease.take() {
            let runtime = &self.runtime;
            lease.release(|| runtime.shutdown());
            info!("Oculus session ended");
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn configure(&mut self) -> Result<FrameBufferDescriptor, ConfigureError> {
        let session = self.session.ok_or(ConfigureError::NotConnected)?;
        let default_fov = match self.hmd {
            Some(ref hmd) => hmd.default_eye_fov,
            None => return Err(ConfigureError::NotConnected),
        };

        let mut sizes = [(0, 0); 2];
        let mut hmd_to_eye = [VRPose::identity(); 2];
        for eye in &VREye::BOTH {
            let i = eye.index();
            sizes[i] = self.runtime.fov_texture_size(session, *eye, default_fov[i]);
            hmd_to_eye[i] = self.runtime.eye_render_desc(session, *eye, default_fov[i]).hmd_to_eye_pose;
        }

        // Both eyes share one side-by-side target.
        let width = sizes[0].0 + sizes[1].0;
        let height = sizes[0].1.max(sizes[1].1);
        if width == 0 || height == 0 {
            return Err(ConfigureError::Runtime(format!("eye texture size is {}x{}", width, height)));
        }

        let descriptor = FrameBufferDescriptor {
            width: width,
            height: height,
            eyes: [EyeDescriptor::new(VREye::Left, hmd_to_eye[0], fov_from_port(&default_fov[0])),
                   EyeDescriptor::new(VREye::Right, hmd_to_eye[1], fov_from_port(&default_fov[1]))],
        };

        let resized = self.setup.map_or(false, |s| (s.descriptor.width, s.descriptor.height) != (width, height));
        if resized {
            self.destroy_swap_chain();
        }

        self.setup = Some(EyeSetup {
            descriptor: descriptor,
            fov: default_fov,
            hmd_to_eye: hmd_to_eye,
            viewports: [OvrRecti { x: 0, y: 0, width: sizes[0].0 as i32, height: sizes[0].1 as i32 },
                        OvrRecti { x: sizes[0].0 as i32, y: 0, width: sizes[1].0 as i32, height: sizes[1].1 as i32 }],
        });
        Ok(descriptor)
    }

    fn poll_frame(&mut self) -> Result<FrameTrackingSnapshot, SessionError> {
        let session = match self.session {
            Some(session) => session,
            None => return Err(SessionError::Runtime("session is not connected".into())),
        };

        let mut snapshot = FrameTrackingSnapshot::default();
        self.session_events(session, &mut snapshot.events)?;

        self.frame_index += 1;
        let display_time = self.runtime.predicted_display_time(session, self.frame_index);
        let tracking = self.runtime.tracking_state(session, display_time);
        self.sensor_sample_time = display_time;

        let input = self.runtime.input_state(session);
        let mut hands = tracking.hands;
        if let Some(ref input) = input {
            for (i, hand) in hands.iter_mut().enumerate() {
                if let Some(hand) = hand.as_mut() {
                    hand.input = Some(touch_input(input, i));
                }
            }
        }

        if let (Some(setup), Some(head)) = (self.setup.as_ref(), tracking.head.as_ref()) {
            let head = &head.pose;
            for i in 0..2 {
                self.render_poses[i] = utils::compose(head, &setup.hmd_to_eye[i]);
            }
            snapshot.eyes = Some([
                EyeDescriptor::new(VREye::Left, self.render_poses[0], setup.descriptor.eyes[0].field_of_view),
                EyeDescriptor::new(VREye::Right, self.render_poses[1], setup.descriptor.eyes[1].field_of_view),
            ]);
        }

        snapshot.timestamp = utils::timestamp();
        snapshot.predicted_display_time = display_time;
        snapshot.head = tracking.head;
        snapshot.hands = hands;
        Ok(snapshot)
    }

    fn submit_frame(&mut self, bridge: &mut dyn TextureBridge, layer: &VRLayer) -> Result<(), SubmitError> {
        let session = self.session.ok_or(SubmitError::NotConnected)?;
        let setup = self.setup.ok_or(SubmitError::NotConfigured)?;
        let size = (setup.descriptor.width, setup.descriptor.height);

        let chain = match self.swap_chain {
            Some(chain) => chain,
            None => {
                let chain = self.runtime.create_swap_chain(session, size.0, size.1).map_err(submit_error)?;
                debug!("Created {}x{} swap chain", size.0, size.1);
                self.swap_chain = Some(chain);
                chain
            }
        };

        let texture = self.runtime.swap_chain_texture(session, chain).map_err(submit_error)?;
        // The swap chain has its origin at the top left.
        bridge.copy_in(layer, texture, size, true)?;
        self.runtime.commit_swap_chain(session, chain).map_err(submit_error)?;

        let eye_layer = OvrLayerEyeFov {
            color_texture: chain,
            viewports: setup.viewports,
            fov: setup.fov,
            render_poses: self.render_poses,
            sensor_sample_time: self.sensor_sample_time,
        };
        self.runtime.submit_frame(session, self.frame_index, &eye_layer).map_err(submit_error)
    }

    fn recenter(&mut self) {
        if let Some(session) = self.session {
            self.runtime.recenter_tracking_origin(session);
        }
    }
}

impl<R: OculusRuntime> Drop for OculusSession<R> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn fov_from_port(fov: &FovPort) -> VRFieldOfView {
    VRFieldOfView::from_tangents(fov.up_tan, fov.right_tan, fov.down_tan, fov.left_tan)
}

fn runtime_error(e: OvrError) -> ConnectError {
    ConnectError::Runtime {
        driver: DriverKind::Oculus,
        message: e.to_string(),
    }
}

fn session_error(e: OvrError) -> SessionError {
    match e {
        OvrError::DisplayLost => SessionError::DisplayLost,
        OvrError::NoHmd => SessionError::DeviceRemoved,
        e => SessionError::Runtime(e.to_string()),
    }
}

fn submit_error(e: OvrError) -> SubmitError {
    match e {
        OvrError::DisplayLost => SubmitError::DisplayLost,
        e => SubmitError::Rejected(e.to_string()),
    }
}

// Touch controller layout: face buttons, thumbstick click, index trigger, then menu on the left hand.
// Axes are thumbstick x, y, index trigger, hand trigger.
fn touch_input(input: &OvrInputState, hand: usize) -> VRControllerInput {
    let (face, thumb, trigger_touch) = if hand == 0 {
        ([BUTTON_X, BUTTON_Y], BUTTON_LTHUMB, TOUCH_LINDEX_TRIGGER)
    } else {
        ([BUTTON_A, BUTTON_B], BUTTON_RTHUMB, TOUCH_RINDEX_TRIGGER)
    };
    let bit = |mask: u32| VRButton::from_masks(mask as u64, input.buttons as u64, input.touches as u64);

    let mut buttons = vec![bit(face[0]), bit(face[1]), bit(thumb)];
    buttons.push(VRButton {
        pressed: input.index_trigger[hand] > 0.5,
        touched: input.touches & trigger_touch != 0,
    });
    if hand == 0 {
        buttons.push(bit(BUTTON_ENTER));
    }

    let stick = input.thumbstick[hand];
    VRControllerInput {
        buttons: buttons,
        axes: vec![stick[0], stick[1], input.index_trigger[hand], input.hand_trigger[hand]],
    }
}
