use super::state::{self, MockVRState, MockVRStateHandle};
use crate::api::openvr::*;
use crate::utils;
use crate::{MockVRControlMsg, TextureId, VREye, VRFieldOfView, VRPose};
use std::sync::MutexGuard;

const LEFT_CONTROLLER_INDEX: u32 = 1;
const RIGHT_CONTROLLER_INDEX: u32 = 2;
// Generic trackers occupy the slots after the controllers.
const FIRST_TRACKER_INDEX: u32 = 3;

/// Scriptable stand-in for the OpenVR runtime.
/// Simulates a virtual HTC Vive.
#[derive(Clone)]
pub struct MockOpenVRRuntime {
    state: MockVRStateHandle,
}

impl MockOpenVRRuntime {
    pub fn new() -> MockOpenVRRuntime {
        let left = VRFieldOfView {
            up_degrees: 55.82093048095703,
            right_degrees: 51.26948547363281,
            down_degrees: 55.707801818847656,
            left_degrees: 54.42263412475586,
        };
        let right = VRFieldOfView {
            up_degrees: 55.898048400878906,
            right_degrees: 54.37410354614258,
            down_degrees: 55.614715576171875,
            left_degrees: 51.304901123046875,
        };
        MockOpenVRRuntime::with_state(MockVRState::new((1512, 1680), [left, right]).into_handle())
    }

    pub fn with_state(state: MockVRStateHandle) -> MockOpenVRRuntime {
        MockOpenVRRuntime {
            state: state,
        }
    }

    pub fn state_handle(&self) -> MockVRStateHandle {
        self.state.clone()
    }

    pub fn handle_msg(&self, msg: MockVRControlMsg) {
        self.state().handle_msg(msg);
    }

    pub fn state(&self) -> MutexGuard<'_, MockVRState> {
        state::lock(&self.state)
    }
}

fn tracked(pose: &VRPose) -> OpenVRTrackedPose {
    OpenVRTrackedPose {
        device_to_absolute: utils::pose_to_matrix34(pose),
        velocity: [0.0; 3],
        angular_velocity: [0.0; 3],
        pose_is_valid: true,
        device_is_connected: true,
    }
}

fn controller_hand(index: u32) -> Option<usize> {
    match index {
        LEFT_CONTROLLER_INDEX => Some(0),
        RIGHT_CONTROLLER_INDEX => Some(1),
        _ => None,
    }
}

impl OpenVRRuntime for MockOpenVRRuntime {
    fn is_runtime_installed(&self) -> bool {
        true
    }

    fn is_hmd_present(&self) -> bool {
        self.state().available
    }

    fn init(&self) -> Result<(), String> {
        let mut state = self.state();
        if let Some(message) = state.fail_next_create.take() {
            return Err(message);
        }
        if !state.available {
            return Err("VRInitError_Init_HmdNotFound".into());
        }
        state.runtime_inits += 1;
        state.sessions_created += 1;
        state.live_sessions += 1;
        Ok(())
    }

    fn shutdown(&self) {
        let mut state = self.state();
        state.runtime_shutdowns += 1;
        state.live_sessions = state.live_sessions.saturating_sub(1);
    }

    fn compositor_available(&self) -> bool {
        self.state().available
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        self.state().recommended_size
    }

    fn projection_raw(&self, eye: VREye) -> ProjectionRaw {
        let (up, right, down, left) = self.state().fov[eye.index()].tangents();
        ProjectionRaw {
            left: -left,
            right: right,
            top: -up,
            bottom: down,
        }
    }

    fn eye_to_head_transform(&self, eye: VREye) -> [[f32; 4]; 3] {
        let offset = self.state().eye_offset(eye.index());
        utils::pose_to_matrix34(&VRPose::from_position(offset))
    }

    fn string_property(&self, _index: u32, property: StringProperty) -> Option<String> {
        let value = match property {
            StringProperty::TrackingSystemName => "lighthouse",
            StringProperty::ModelNumber => "Mock Vive",
            StringProperty::SerialNumber => "MOCK-VIVE-0001",
            StringProperty::ManufacturerName => "HTC",
            StringProperty::FirmwareVersion => "1462663157",
        };
        Some(value.into())
    }

    fn float_property(&self, _index: u32, property: FloatProperty) -> Option<f32> {
        match property {
            FloatProperty::DisplayFrequency => Some(90.0),
            FloatProperty::UserIpdMeters => Some(self.state().ipd),
        }
    }

    fn wait_get_poses(&self, poses: &mut [OpenVRTrackedPose]) -> Result<(), CompositorError> {
        let state = self.state();
        for pose in poses.iter_mut() {
            *pose = OpenVRTrackedPose::default();
        }
        if let Some(hmd) = poses.get_mut(HMD_DEVICE_INDEX as usize) {
            if let Some(ref head) = state.head {
                *hmd = tracked(head);
            }
            hmd.device_is_connected = state.hmd_present;
        }
        for index in &[LEFT_CONTROLLER_INDEX, RIGHT_CONTROLLER_INDEX] {
            let hand = controller_hand(*index).unwrap_or(0);
            if let (Some(pose), Some(slot)) = (state.controllers[hand].as_ref(), poses.get_mut(*index as usize)) {
                *slot = tracked(pose);
            }
        }
        for (slot, tracker) in state.trackers.iter().enumerate() {
            let index = FIRST_TRACKER_INDEX as usize + slot;
            if let (Some(pose), Some(target)) = (tracker.as_ref(), poses.get_mut(index)) {
                *target = tracked(pose);
            }
        }
        if state.focused {
            Ok(())
        } else {
            Err(CompositorError::DoNotHaveFocus)
        }
    }

    fn device_class(&self, index: u32) -> DeviceClass {
        match index {
            HMD_DEVICE_INDEX => DeviceClass::Hmd,
            LEFT_CONTROLLER_INDEX | RIGHT_CONTROLLER_INDEX => DeviceClass::Controller,
            _ if index >= FIRST_TRACKER_INDEX => {
                let slot = (index - FIRST_TRACKER_INDEX) as usize;
                match self.state().trackers.get(slot) {
                    Some(Some(_)) => DeviceClass::GenericTracker,
                    _ => DeviceClass::Invalid,
                }
            }
            _ => DeviceClass::Invalid,
        }
    }

    fn controller_role(&self, index: u32) -> ControllerRole {
        match index {
            LEFT_CONTROLLER_INDEX => ControllerRole::LeftHand,
            RIGHT_CONTROLLER_INDEX => ControllerRole::RightHand,
            _ => ControllerRole::Invalid,
        }
    }

    fn controller_state(&self, index: u32) -> Option<OpenVRControllerState> {
        let hand = controller_hand(index)?;
        let state = self.state();
        if state.controllers[hand].is_none() {
            return None;
        }
        let axes = state.axes[hand];
        let mut axis = [[0.0; 2]; 5];
        axis[0] = [axes[0], axes[1]];
        axis[1] = [axes[2], 0.0];
        Some(OpenVRControllerState {
            packet_num: 0,
            button_pressed: state.pressed[hand],
            button_touched: state.touched[hand],
            axis: axis,
        })
    }

    fn poll_next_event(&self) -> Option<OpenVREvent> {
        self.state().events.pop_front()
    }

    fn submit(&self, _eye: VREye, texture: TextureId, _bounds: &TextureBounds) -> Result<(), CompositorError> {
        let mut state = self.state();
        if !state.focused {
            return Err(CompositorError::DoNotHaveFocus);
        }
        state.last_submitted_texture = Some(texture);
        Ok(())
    }

    fn post_present_handoff(&self) {
        self.state().submitted_frames += 1;
    }

    fn reset_seated_zero_pose(&self) {
        self.state().recenters += 1;
    }
}
