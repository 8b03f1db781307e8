use crate::gpu::{GpuContext, RenderTarget, TextureCopy};
use crate::{GpuResourceError, TextureBridge, TextureId, VRLayer};
use std::rc::Rc;

/// The offscreen target HMD frames are staged in, plus the texture copy
/// sessions use to move the host's scene texture onto runtime textures.
///
/// The bridge lives as long as the GPU context, not as long as a driver
/// session; the controller decides when it is allocated.
pub struct FrameBufferBridge {
    gpu: Rc<dyn GpuContext>,
    target: Option<RenderTarget>,
}

impl FrameBufferBridge {
    pub fn new(gpu: Rc<dyn GpuContext>) -> FrameBufferBridge {
        FrameBufferBridge {
            gpu: gpu,
            target: None,
        }
    }

    /// Creates the target, or replaces it when the size changed.
    /// If the new target cannot be created the previous one is kept.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<(), GpuResourceError> {
        if let Some(ref target) = self.target {
            if target.width == width && target.height == height {
                return Ok(());
            }
        }
        let target = self.gpu.create_render_target(width, height)?;
        if let Some(old) = self.target.replace(target) {
            self.gpu.destroy_render_target(&old);
        }
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(target) = self.target.take() {
            self.gpu.destroy_render_target(&target);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.target.map(|t| (t.width, t.height))
    }
}

impl TextureBridge for FrameBufferBridge {
    fn local_texture(&self) -> Result<(TextureId, u32, u32), GpuResourceError> {
        self.target
            .map(|t| (t.color, t.width, t.height))
            .ok_or(GpuResourceError::NotAllocated)
    }

    fn copy_in(&mut self,
               source: &VRLayer,
               destination: TextureId,
               size: (u32, u32),
               flip_vertical: bool)
               -> Result<(), GpuResourceError> {
        self.gpu.copy_texture(&TextureCopy {
            source: source.texture_id,
            source_target: source.texture_target,
            source_size: source.texture_size,
            destination: destination,
            destination_size: size,
            flip_vertical: flip_vertical,
        })
    }
}

impl Drop for FrameBufferBridge {
    fn drop(&mut self) {
        self.release();
    }
}
