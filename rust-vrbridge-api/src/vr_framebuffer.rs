use crate::EyeDescriptor;

// Render target layout negotiated by DriverSession::configure.
// Both eyes are rendered side by side into a single width x height target.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct FrameBufferDescriptor {
    pub width: u32,
    pub height: u32,
    // Eye poses relative to the head.
    pub eyes: [EyeDescriptor; 2],
}
