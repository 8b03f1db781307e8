pub type TextureId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum TextureTarget {
    Texture2D,
    // GL_TEXTURE_RECTANGLE, addressed in texels rather than normalized coordinates.
    Rectangle,
}

// The scene texture submitted by the host plus the per-eye UV bounds
// (x, y, width, height) within it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRLayer {
    pub texture_id: TextureId,
    pub texture_target: TextureTarget,
    pub texture_size: (u32, u32),
    pub left_bounds: [f32; 4],
    pub right_bounds: [f32; 4],
}

impl Default for VRLayer {
    fn default() -> VRLayer {
        VRLayer {
            texture_id: 0,
            texture_target: TextureTarget::Rectangle,
            texture_size: (0, 0),
            left_bounds: [0.0, 0.0, 0.5, 1.0],
            right_bounds: [0.5, 0.0, 0.5, 1.0],
        }
    }
}

impl VRLayer {
    pub fn new(texture_id: TextureId, width: u32, height: u32) -> VRLayer {
        VRLayer {
            texture_id: texture_id,
            texture_size: (width, height),
            ..VRLayer::default()
        }
    }

    pub fn with_target(self, target: TextureTarget) -> VRLayer {
        VRLayer {
            texture_target: target,
            ..self
        }
    }
}
