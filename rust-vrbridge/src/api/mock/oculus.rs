use super::state::{self, MockVRState, MockVRStateHandle};
use crate::api::oculusvr::*;
use crate::{MockVRControlMsg, TextureId, TrackedDevicePose, VREye, VRFieldOfView, VRPose};
use std::sync::MutexGuard;
use std::time::Duration;

// First texture name handed out for swap chains.
const SWAP_CHAIN_TEXTURE_BASE: TextureId = 1000;

/// Scriptable stand-in for LibOVR.
/// Simulates a Rift CV1: 1182x1461 per eye, 90 Hz.
#[derive(Clone)]
pub struct MockOculusRuntime {
    state: MockVRStateHandle,
}

impl MockOculusRuntime {
    pub fn new() -> MockOculusRuntime {
        let fov = VRFieldOfView::from_tangents(1.3316, 1.0586, 1.3316, 1.0924);
        let mirrored = VRFieldOfView {
            left_degrees: fov.right_degrees,
            right_degrees: fov.left_degrees,
            ..fov
        };
        MockOculusRuntime::with_state(MockVRState::new((1182, 1461), [fov, mirrored]).into_handle())
    }

    pub fn with_state(state: MockVRStateHandle) -> MockOculusRuntime {
        MockOculusRuntime {
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

fn fov_port(fov: &VRFieldOfView) -> FovPort {
    let (up, right, down, left) = fov.tangents();
    FovPort {
        up_tan: up,
        down_tan: down,
        left_tan: left,
        right_tan: right,
    }
}

fn tracked(pose: VRPose) -> TrackedDevicePose {
    TrackedDevicePose {
        linear_velocity: Some([0.0; 3]),
        angular_velocity: Some([0.0; 3]),
        ..TrackedDevicePose::new(pose)
    }
}

impl OculusRuntime for MockOculusRuntime {
    fn detect(&self, _timeout: Duration) -> bool {
        self.state().available
    }

    fn initialize(&self) -> Result<(), OvrError> {
        let mut state = self.state();
        if !state.available {
            return Err(OvrError::ServiceConnection);
        }
        state.runtime_inits += 1;
        Ok(())
    }

    fn shutdown(&self) {
        self.state().runtime_shutdowns += 1;
    }

    fn create_session(&self) -> Result<OvrSession, OvrError> {
        let mut state = self.state();
        if let Some(message) = state.fail_next_create.take() {
            return Err(OvrError::Failure(message));
        }
        if !state.available {
            return Err(OvrError::NoHmd);
        }
        state.sessions_created += 1;
        state.live_sessions += 1;
        Ok(state.next_handle())
    }

    fn destroy_session(&self, _session: OvrSession) {
        let mut state = self.state();
        state.live_sessions = state.live_sessions.saturating_sub(1);
    }

    fn hmd_desc(&self, _session: OvrSession) -> OvrHmdDesc {
        let state = self.state();
        OvrHmdDesc {
            product_name: "Oculus Rift CV1 (mock)".into(),
            manufacturer: "Oculus VR".into(),
            serial_number: "MOCK-OVR-0001".into(),
            firmware_major: 708,
            firmware_minor: 34,
            resolution: (2160, 1200),
            display_refresh_rate: 90.0,
            default_eye_fov: [fov_port(&state.fov[0]), fov_port(&state.fov[1])],
        }
    }

    fn fov_texture_size(&self, _session: OvrSession, _eye: VREye, _fov: FovPort) -> (u32, u32) {
        self.state().recommended_size
    }

    fn eye_render_desc(&self, _session: OvrSession, eye: VREye, fov: FovPort) -> OvrEyeRenderDesc {
        OvrEyeRenderDesc {
            fov: fov,
            hmd_to_eye_pose: VRPose::from_position(self.state().eye_offset(eye.index())),
        }
    }

    fn session_status(&self, _session: OvrSession) -> Result<OvrSessionStatus, OvrError> {
        let mut state = self.state();
        let should_recenter = state.pending_recenter;
        state.pending_recenter = false;
        Ok(OvrSessionStatus {
            is_visible: state.focused,
            hmd_present: state.hmd_present,
            hmd_mounted: state.mounted,
            display_lost: state.display_lost,
            should_quit: state.should_quit,
            should_recenter: should_recenter,
            has_input_focus: state.focused,
        })
    }

    fn recenter_tracking_origin(&self, _session: OvrSession) {
        self.state().recenters += 1;
    }

    fn predicted_display_time(&self, _session: OvrSession, frame_index: u64) -> f64 {
        frame_index as f64 / 90.0
    }

    fn tracking_state(&self, _session: OvrSession, _abs_time: f64) -> OvrTrackingState {
        let state = self.state();
        OvrTrackingState {
            head: state.head.map(tracked),
            hands: [state.controllers[0].map(tracked), state.controllers[1].map(tracked)],
        }
    }

    fn input_state(&self, _session: OvrSession) -> Option<OvrInputState> {
        let state = self.state();
        if state.controllers.iter().all(Option::is_none) {
            return None;
        }
        let axes = state.axes;
        Some(OvrInputState {
            buttons: (state.pressed[0] | state.pressed[1]) as u32,
            touches: (state.touched[0] | state.touched[1]) as u32,
            index_trigger: [axes[0][2], axes[1][2]],
            hand_trigger: [axes[0][3], axes[1][3]],
            thumbstick: [[axes[0][0], axes[0][1]], [axes[1][0], axes[1][1]]],
        })
    }

    fn create_swap_chain(&self, _session: OvrSession, _width: u32, _height: u32) -> Result<OvrSwapChain, OvrError> {
        let mut state = self.state();
        if state.display_lost {
            return Err(OvrError::DisplayLost);
        }
        state.live_swap_chains += 1;
        Ok(state.next_handle())
    }

    fn destroy_swap_chain(&self, _session: OvrSession, _chain: OvrSwapChain) {
        let mut state = self.state();
        state.live_swap_chains = state.live_swap_chains.saturating_sub(1);
    }

    fn swap_chain_texture(&self, _session: OvrSession, chain: OvrSwapChain) -> Result<TextureId, OvrError> {
        if self.state().display_lost {
            return Err(OvrError::DisplayLost);
        }
        Ok(SWAP_CHAIN_TEXTURE_BASE + chain as TextureId)
    }

    fn commit_swap_chain(&self, _session: OvrSession, _chain: OvrSwapChain) -> Result<(), OvrError> {
        if self.state().display_lost {
            return Err(OvrError::DisplayLost);
        }
        Ok(())
    }

    fn submit_frame(&self, _session: OvrSession, _frame_index: u64, layer: &OvrLayerEyeFov) -> Result<(), OvrError> {
        let mut state = self.state();
        if state.display_lost {
            return Err(OvrError::DisplayLost);
        }
        state.submitted_frames += 1;
        state.last_submitted_texture = Some(SWAP_CHAIN_TEXTURE_BASE + layer.color_texture as TextureId);
        Ok(())
    }
}
