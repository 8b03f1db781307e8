// Non-fatal housekeeping events reported by a driver session while polling.
// Fatal conditions (display lost, quit requests) are reported as SessionError instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum VRSessionEvent {
    // The runtime asked the application to recenter; the seated origin was reset.
    Recentered,

    // The user has put the HMD on.
    Mounted,

    // The user has taken the HMD off.
    Unmounted,

    // Presentation is paused by the runtime (dashboard, another application in focus).
    Blur,

    // Presentation has resumed after a Blur.
    Focus,

    // Eye offsets, projections or play area changed (e.g. IPD adjustment).
    ConfigurationChanged,
}
