use super::runtime::*;
use crate::runtime_registry::{RuntimeLease, RuntimeRegistry};
use crate::utils;
use crate::{ConfigureError, ConnectError, DriverKind, DriverSession, DriverSessionCreator, EyeDescriptor,
            FrameBufferDescriptor, FrameTrackingSnapshot, SessionError, SubmitError, TextureBridge,
            TrackedDevicePose, VRButton, VRControllerInput, VRDeviceInfo, VREye, VRFieldOfView, VRLayer,
            VRSessionEvent};
use std::sync::Arc;

// EVRButtonId values used by the controller mapping.
const BUTTON_APPLICATION_MENU: u32 = 1;
const BUTTON_GRIP: u32 = 2;
const BUTTON_TOUCHPAD: u32 = 32;
const BUTTON_TRIGGER: u32 = 33;

pub struct OpenVRSessionCreator<R> {
    runtime: R,
    registry: Arc<RuntimeRegistry>,
}

impl<R: OpenVRRuntime + Clone + 'static> OpenVRSessionCreator<R> {
    pub fn new(runtime: R, registry: Arc<RuntimeRegistry>) -> Box<dyn DriverSessionCreator> {
        Box::new(OpenVRSessionCreator {
            runtime: runtime,
            registry: registry,
        })
    }
}

impl<R: OpenVRRuntime + Clone + 'static> DriverSessionCreator for OpenVRSessionCreator<R> {
    fn kind(&self) -> DriverKind {
        DriverKind::OpenVR
    }

    fn new_session(&self) -> Box<dyn DriverSession> {
        Box::new(OpenVRSession::new(self.runtime.clone(), self.registry.clone()))
    }
}

// OpenVR driver session
pub struct OpenVRSession<R: OpenVRRuntime> {
    runtime: R,
    registry: Arc<RuntimeRegistry>,
    lease: Option<RuntimeLease>,
    device_info: Option<VRDeviceInfo>,
    descriptor: Option<FrameBufferDescriptor>,
    // Filled in place by wait_get_poses every frame.
    poses: [OpenVRTrackedPose; MAX_TRACKED_DEVICES],
    // Last valid head pose, kept while another application has focus.
    head: Option<TrackedDevicePose>,
}

impl<R: OpenVRRuntime> OpenVRSession<R> {
    pub fn new(runtime: R, registry: Arc<RuntimeRegistry>) -> OpenVRSession<R> {
        OpenVRSession {
            runtime: runtime,
            registry: registry,
            lease: None,
            device_info: None,
            descriptor: None,
            poses: [OpenVRTrackedPose::default(); MAX_TRACKED_DEVICES],
            head: None,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn fetch_device_info(&self) -> VRDeviceInfo {
        let index = HMD_DEVICE_INDEX;
        let (width, height) = self.runtime.recommended_render_target_size();
        let mut info = VRDeviceInfo::new(DriverKind::OpenVR);
        info.name = self.runtime.string_property(index, StringProperty::ModelNumber).unwrap_or_default();
        info.serial = self.runtime.string_property(index, StringProperty::SerialNumber).unwrap_or_default();
        info.firmware = self.runtime.string_property(index, StringProperty::FirmwareVersion).unwrap_or_default();
        info.render_width = width * 2;
        info.render_height = height;
        info.refresh_rate = self.runtime.float_property(index, FloatProperty::DisplayFrequency);
        info
    }

    fn eye_descriptor(&self, eye: VREye) -> EyeDescriptor {
        let raw = self.runtime.projection_raw(eye);
        // OpenVR returns clipping plane coordinates in raw tangent units,
        // with the top plane negative.
        let fov = VRFieldOfView::from_tangents(-raw.top, raw.right, raw.bottom, -raw.left);
        let pose = utils::matrix34_to_pose(&self.runtime.eye_to_head_transform(eye));
        EyeDescriptor::new(eye, pose, fov)
    }

    fn drain_events(&mut self, events: &mut Vec<VRSessionEvent>) -> Result<(), SessionError> {
        while let Some(event) = self.runtime.poll_next_event() {
            match event {
                OpenVREvent::Quit => return Err(SessionError::ShouldQuit),
                OpenVREvent::TrackedDeviceDeactivated(HMD_DEVICE_INDEX) => return Err(SessionError::DisplayLost),
                OpenVREvent::IpdChanged | OpenVREvent::ChaperoneDataHasChanged => {
                    events.push(VRSessionEvent::ConfigurationChanged);
                }
                OpenVREvent::DashboardActivated => events.push(VRSessionEvent::Blur),
                OpenVREvent::DashboardDeactivated => events.push(VRSessionEvent::Focus),
                OpenVREvent::TrackedDeviceUserInteractionStarted(HMD_DEVICE_INDEX) => {
                    events.push(VRSessionEvent::Mounted);
                }
                OpenVREvent::TrackedDeviceUserInteractionEnded(HMD_DEVICE_INDEX) => {
                    events.push(VRSessionEvent::Unmounted);
                }
                OpenVREvent::SeatedZeroPoseReset => events.push(VRSessionEvent::Recentered),
                _ => {}
            }
        }
        Ok(())
    }

    fn controller_input(&self, index: u32) -> Option<VRControllerInput> {
        let state = self.runtime.controller_state(index)?;
        let buttons = [BUTTON_TRIGGER, BUTTON_GRIP, BUTTON_TOUCHPAD, BUTTON_APPLICATION_MENU]
            .iter()
            .map(|id| VRButton::from_masks(button_mask(*id), state.button_pressed, state.button_touched))
            .collect();
        let trackpad = state.axis[0];
        // Analog trigger data is in only the X axis
        let trigger = state.axis[1][0];
        Some(VRControllerInput {
            buttons: buttons,
            axes: vec![trackpad[0], trackpad[1], trigger],
        })
    }
}

impl<R: OpenVRRuntime> DriverSession for OpenVRSession<R> {
    fn kind(&self) -> DriverKind {
        DriverKind::OpenVR
    }

    fn check_availability(&mut self) -> bool {
        self.runtime.is_runtime_installed() && self.runtime.is_hmd_present()
    }

    fn connect(&mut self) -> Result<VRDeviceInfo, ConnectError> {
        if let Some(ref info) = self.device_info {
            return Ok(info.clone());
        }

        let runtime = &self.runtime;
        let lease = self.registry
            .acquire(DriverKind::OpenVR, || runtime.init())
            .map_err(|message| ConnectError::Runtime {
                driver: DriverKind::OpenVR,
                message: message,
            })?;

        if !runtime.compositor_available() {
            error!("Error initializing OpenVR compositor");
            lease.release(|| runtime.shutdown());
            return Err(ConnectError::Runtime {
                driver: DriverKind::OpenVR,
                message: "compositor unavailable".into(),
            });
        }

        let info = self.fetch_device_info();
        info!("OpenVR session started on {} ({})", info.name, info.serial);
        self.lease = Some(lease);
        self.device_info = Some(info.clone());
        Ok(info)
    }

    fn disconnect(&mut self) {
        self.descriptor = None;
        self.device_info = None;
        if let Some(lease) = self.lease.take() {
            let runtime = &self.runtime;
            lease.release(|| runtime.shutdown());
            info!("OpenVR session ended");
        }
    }

    fn is_connected(&self) -> bool {
        self.lease.is_some()
    }

    fn configure(&mut self) -> Result<FrameBufferDescriptor, ConfigureError> {
        if !self.is_connected() {
            return Err(ConfigureError::NotConnected);
        }
        let (width, height) = self.runtime.recommended_render_target_size();
        if width == 0 || height == 0 {
            return Err(ConfigureError::Runtime(format!("recommended render target size is {}x{}", width, height)));
        }
        let descriptor = FrameBufferDescriptor {
            width: width * 2,
            height: height,
            eyes: [self.eye_descriptor(VREye::Left), self.eye_descriptor(VREye::Right)],
        };
        self.descriptor = Some(descriptor);
        Ok(descriptor)
    }

    fn poll_frame(&mut self) -> Result<FrameTrackingSnapshot, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::Runtime("session is not connected".into()));
        }

        let mut snapshot = FrameTrackingSnapshot::default();
        self.drain_events(&mut snapshot.events)?;

        match self.runtime.wait_get_poses(&mut self.poses) {
            Ok(()) => {}
            // Another scene application has focus; keep the last poses.
            Err(CompositorError::DoNotHaveFocus) => {}
            Err(e) => return Err(SessionError::Runtime(format!("WaitGetPoses failed: {:?}", e))),
        }

        let hmd = &self.poses[HMD_DEVICE_INDEX as usize];
        if !hmd.device_is_connected {
            return Err(SessionError::DeviceRemoved);
        }
        if hmd.pose_is_valid {
            self.head = Some(tracked_pose(hmd));
        }
        snapshot.head = self.head.clone();

        for index in 1..MAX_TRACKED_DEVICES as u32 {
            let pose = &self.poses[index as usize];
            if !pose.device_is_connected || !pose.pose_is_valid {
                continue;
            }
            match self.runtime.device_class(index) {
                DeviceClass::Controller => {
                    let hand = match self.runtime.controller_role(index) {
                        ControllerRole::LeftHand => 0,
                        ControllerRole::RightHand => 1,
                        ControllerRole::Invalid => continue,
                    };
                    let mut device = tracked_pose(pose);
                    device.input = self.controller_input(index);
                    snapshot.hands[hand] = Some(device);
                }
                DeviceClass::GenericTracker => snapshot.trackers.push(tracked_pose(pose)),
                _ => {}
            }
        }

        if let (Some(descriptor), Some(head)) = (self.descriptor.as_ref(), snapshot.head.as_ref()) {
            let head = &head.pose;
            let eye = |d: &EyeDescriptor| EyeDescriptor::new(d.eye, utils::compose(head, &d.pose), d.field_of_view);
            snapshot.eyes = Some([eye(&descriptor.eyes[0]), eye(&descriptor.eyes[1])]);
        }

        snapshot.timestamp = utils::timestamp();
        Ok(snapshot)
    }

    fn submit_frame(&mut self, bridge: &mut dyn TextureBridge, layer: &VRLayer) -> Result<(), SubmitError> {
        if !self.is_connected() {
            return Err(SubmitError::NotConnected);
        }
        if self.descriptor.is_none() {
            return Err(SubmitError::NotConfigured);
        }

        let (texture, width, height) = bridge.local_texture()?;
        bridge.copy_in(layer, texture, (width, height), false)?;

        let bounds = [TextureBounds::from_layer_bounds(&layer.left_bounds),
                      TextureBounds::from_layer_bounds(&layer.right_bounds)];
        for eye in &VREye::BOTH {
            self.runtime
                .submit(*eye, texture, &bounds[eye.index()])
                .map_err(|e| SubmitError::Rejected(format!("{:?}", e)))?;
        }
        self.runtime.post_present_handoff();
        Ok(())
    }

    fn recenter(&mut self) {
        if self.is_connected() {
            self.runtime.reset_seated_zero_pose();
        }
    }
}

impl<R: OpenVRRuntime> Drop for OpenVRSession<R> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn tracked_pose(pose: &OpenVRTrackedPose) -> TrackedDevicePose {
    TrackedDevicePose {
        pose: utils::matrix34_to_pose(&pose.device_to_absolute),
        linear_velocity: Some(pose.velocity),
        angular_velocity: Some(pose.angular_velocity),
        input: None,
    }
}

#[inline]
fn button_mask(id: u32) -> u64 {
    1u64 << id
}

