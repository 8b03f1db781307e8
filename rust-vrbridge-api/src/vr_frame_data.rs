use crate::{EyeDescriptor, TrackedDevicePose, VRSessionEvent};

// Tracking state of one frame, predicted for the instant it will be displayed.
// All poses are in the session's tracking space.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct FrameTrackingSnapshot {
    // Milliseconds, taken when the snapshot was polled.
    pub timestamp: f64,

    // Runtime clock, seconds. Zero when the runtime does not predict.
    pub predicted_display_time: f64,

    // None until the runtime has reported a valid head pose.
    pub head: Option<TrackedDevicePose>,

    // Indexed by VRHand.
    pub hands: [Option<TrackedDevicePose>; 2],

    pub trackers: Vec<TrackedDevicePose>,

    // Per-eye render poses. None when the driver only supplies the head.
    pub eyes: Option<[EyeDescriptor; 2]>,

    pub events: Vec<VRSessionEvent>,
}
