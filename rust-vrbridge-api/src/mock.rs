use crate::{VRFieldOfView, VRHand, VRPose};

// Messages scripting a mock runtime through its state handle.
#[derive(Debug, Clone)]
pub enum MockVRControlMsg {
    // Service/HMD presence as reported to availability checks and init calls.
    SetAvailable(bool),
    // Makes the next session creation fail with the given message.
    FailNextCreate(String),
    // None while the HMD has no valid pose.
    SetHeadPose(Option<VRPose>),
    SetControllerPose(VRHand, Option<VRPose>),
    // Generic tracker by slot; None unplugs it.
    SetTrackerPose(usize, Option<VRPose>),
    // Pressed and touched button masks in the runtime's own bit layout.
    SetControllerButtons(VRHand, u64, u64),
    // Stick or trackpad x, y, then trigger and grip.
    SetControllerAxes(VRHand, [f32; 4]),
    // Per-eye recommended render size.
    SetRecommendedSize(u32, u32),
    SetFieldOfView(VRFieldOfView, VRFieldOfView),
    SetIpd(f32),
    DisplayLost,
    // The HMD is unplugged without the runtime reporting a lost display.
    RemoveHmd,
    Quit,
    Recenter,
    Focus,
    Blur,
    Mount,
    Unmount,
}
