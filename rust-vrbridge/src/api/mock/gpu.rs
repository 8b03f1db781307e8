use crate::gpu::{GpuContext, RenderTarget, TextureCopy};
use crate::GpuResourceError;
use std::cell::{Cell, RefCell};

/// Records GPU calls instead of making them.
pub struct MockGpuContext {
    next_name: Cell<u32>,
    created: Cell<usize>,
    live: RefCell<Vec<RenderTarget>>,
    copies: RefCell<Vec<TextureCopy>>,
    fail_next: Cell<bool>,
    max_size: u32,
}

impl MockGpuContext {
    pub fn new() -> MockGpuContext {
        MockGpuContext {
            next_name: Cell::new(1),
            created: Cell::new(0),
            live: RefCell::new(Vec::new()),
            copies: RefCell::new(Vec::new()),
            fail_next: Cell::new(false),
            max_size: 16384,
        }
    }

    pub fn fail_next_allocation(&self) {
        self.fail_next.set(true);
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn live_targets(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn live_target(&self) -> Option<RenderTarget> {
        self.live.borrow().last().cloned()
    }

    pub fn copies(&self) -> Vec<TextureCopy> {
        self.copies.borrow().clone()
    }

    fn name(&self) -> u32 {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }
}

impl GpuContext for MockGpuContext {
    fn create_render_target(&self, width: u32, height: u32) -> Result<RenderTarget, GpuResourceError> {
        if self.fail_next.replace(false) {
            return Err(GpuResourceError::IncompleteFramebuffer(0x8CD6));
        }
        if width == 0 || height == 0 || width > self.max_size || height > self.max_size {
            return Err(GpuResourceError::InvalidDimensions(width, height));
        }
        let target = RenderTarget {
            fbo: self.name(),
            depth: Some(self.name()),
            color: self.name(),
            width: width,
            height: height,
        };
        self.created.set(self.created.get() + 1);
        self.live.borrow_mut().push(target);
        Ok(target)
    }

    fn destroy_render_target(&self, target: &RenderTarget) {
        self.live.borrow_mut().retain(|t| t != target);
    }

    fn copy_texture(&self, copy: &TextureCopy) -> Result<(), GpuResourceError> {
        if copy.destination_size.0 == 0 || copy.destination_size.1 == 0 {
            return Err(GpuResourceError::InvalidDimensions(copy.destination_size.0, copy.destination_size.1));
        }
        self.copies.borrow_mut().push(*copy);
        Ok(())
    }
}
