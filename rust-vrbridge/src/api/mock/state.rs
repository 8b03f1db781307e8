use crate::api::openvr::OpenVREvent;
use crate::{MockVRControlMsg, TextureId, VRFieldOfView, VRPose};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub type MockVRStateHandle = Arc<Mutex<MockVRState>>;

/// Everything a mock runtime reports, plus counters of the native resources
/// it has handed out so tests can check that sessions give them back.
#[derive(Debug, Clone)]
pub struct MockVRState {
    pub available: bool,
    pub fail_next_create: Option<String>,

    pub head: Option<VRPose>,
    pub hmd_present: bool,
    pub controllers: [Option<VRPose>; 2],
    pub trackers: Vec<Option<VRPose>>,
    pub pressed: [u64; 2],
    pub touched: [u64; 2],
    pub axes: [[f32; 4]; 2],
    pub recommended_size: (u32, u32),
    pub fov: [VRFieldOfView; 2],
    pub ipd: f32,

    pub display_lost: bool,
    pub should_quit: bool,
    pub pending_recenter: bool,
    pub focused: bool,
    pub mounted: bool,
    pub events: VecDeque<OpenVREvent>,

    pub runtime_inits: usize,
    pub runtime_shutdowns: usize,
    pub sessions_created: usize,
    pub live_sessions: usize,
    pub live_swap_chains: usize,
    pub recenters: usize,
    pub submitted_frames: usize,
    pub last_submitted_texture: Option<TextureId>,
    next_handle: u64,
}

impl MockVRState {
    pub fn new(recommended_size: (u32, u32), fov: [VRFieldOfView; 2]) -> MockVRState {
        MockVRState {
            available: true,
            fail_next_create: None,
            head: Some(VRPose::from_position([0.0, 1.6, 0.0])),
            hmd_present: true,
            controllers: [None, None],
            trackers: Vec::new(),
            pressed: [0; 2],
            touched: [0; 2],
            axes: [[0.0; 4]; 2],
            recommended_size: recommended_size,
            fov: fov,
            ipd: 0.064,
            display_lost: false,
            should_quit: false,
            pending_recenter: false,
            focused: true,
            mounted: true,
            events: VecDeque::new(),
            runtime_inits: 0,
            runtime_shutdowns: 0,
            sessions_created: 0,
            live_sessions: 0,
            live_swap_chains: 0,
            recenters: 0,
            submitted_frames: 0,
            last_submitted_texture: None,
            next_handle: 1,
        }
    }

    pub fn into_handle(self) -> MockVRStateHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Offset of one eye from the head, half the IPD to either side.
    pub fn eye_offset(&self, eye_index: usize) -> [f32; 3] {
        let half = self.ipd / 2.0;
        [if eye_index == 0 { -half } else { half }, 0.0, 0.0]
    }

    pub fn handle_msg(&mut self, msg: MockVRControlMsg) {
        match msg {
            MockVRControlMsg::SetAvailable(available) => self.available = available,
            MockVRControlMsg::FailNextCreate(message) => self.fail_next_create = Some(message),
            MockVRControlMsg::SetHeadPose(pose) => self.head = pose,
            MockVRControlMsg::SetControllerPose(hand, pose) => self.controllers[hand.index()] = pose,
            MockVRControlMsg::SetTrackerPose(slot, pose) => {
                if self.trackers.len() <= slot {
                    self.trackers.resize(slot + 1, None);
                }
                self.trackers[slot] = pose;
            }
            MockVRControlMsg::SetControllerButtons(hand, pressed, touched) => {
                self.pressed[hand.index()] = pressed;
                self.touched[hand.index()] = touched;
            }
            MockVRControlMsg::SetControllerAxes(hand, axes) => self.axes[hand.index()] = axes,
            MockVRControlMsg::SetRecommendedSize(width, height) => self.recommended_size = (width, height),
            MockVRControlMsg::SetFieldOfView(left, right) => self.fov = [left, right],
            MockVRControlMsg::SetIpd(ipd) => {
                self.ipd = ipd;
                self.events.push_back(OpenVREvent::IpdChanged);
            }
            MockVRControlMsg::DisplayLost => {
                self.display_lost = true;
                self.events.push_back(OpenVREvent::TrackedDeviceDeactivated(0));
            }
            MockVRControlMsg::RemoveHmd => self.hmd_present = false,
            MockVRControlMsg::Quit => {
                self.should_quit = true;
                self.events.push_back(OpenVREvent::Quit);
            }
            MockVRControlMsg::Recenter => {
                self.pending_recenter = true;
                self.events.push_back(OpenVREvent::SeatedZeroPoseReset);
            }
            MockVRControlMsg::Focus => {
                self.focused = true;
                self.events.push_back(OpenVREvent::DashboardDeactivated);
            }
            MockVRControlMsg::Blur => {
                self.focused = false;
                self.events.push_back(OpenVREvent::DashboardActivated);
            }
            MockVRControlMsg::Mount => {
                self.mounted = true;
                self.events.push_back(OpenVREvent::TrackedDeviceUserInteractionStarted(0));
            }
            MockVRControlMsg::Unmount => {
                self.mounted = false;
                self.events.push_back(OpenVREvent::TrackedDeviceUserInteractionEnded(0));
            }
        }
    }
}

pub(super) fn lock(state: &MockVRStateHandle) -> MutexGuard<'_, MockVRState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
