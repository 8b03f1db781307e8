//! GPU resources behind the frame buffer bridge.
//!
//! Everything that touches GL goes through [`GpuContext`], so the controller and
//! the driver sessions can be driven without a live context.

use crate::{GpuResourceError, TextureId, TextureTarget};

/// Offscreen color + depth target the HMD frames are staged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub fbo: u32,
    pub depth: Option<u32>,
    pub color: TextureId,
    pub width: u32,
    pub height: u32,
}

/// A filtered copy of a whole source texture onto a whole destination texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureCopy {
    pub source: TextureId,
    pub source_target: TextureTarget,
    pub source_size: (u32, u32),
    pub destination: TextureId,
    pub destination_size: (u32, u32),
    pub flip_vertical: bool,
}

pub trait GpuContext {
    fn create_render_target(&self, width: u32, height: u32) -> Result<RenderTarget, GpuResourceError>;

    fn destroy_render_target(&self, target: &RenderTarget);

    /// Must leave every GL binding and enable it touches as it found them.
    fn copy_texture(&self, copy: &TextureCopy) -> Result<(), GpuResourceError>;
}

#[cfg(feature = "glcontext")]
pub use self::gleam_context::GleamContext;

#[cfg(feature = "glcontext")]
mod gleam_context {
    use super::{GpuContext, RenderTarget, TextureCopy};
    use crate::{GpuResourceError, TextureTarget};
    use gleam::gl::{self, GLint, GLuint, Gl};
    use std::rc::Rc;

    /// `GpuContext` over the host's current GL context.
    pub struct GleamContext {
        gl: Rc<dyn Gl>,
    }

    impl GleamContext {
        pub fn new(gl: Rc<dyn Gl>) -> GleamContext {
            GleamContext {
                gl: gl,
            }
        }

        fn integer(&self, name: gl::GLenum) -> GLint {
            let mut value = [0];
            unsafe { self.gl.get_integer_v(name, &mut value) };
            value[0]
        }
    }

    /// Read and draw framebuffer bindings, which can differ.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct FramebufferBindings {
        draw: GLuint,
        read: GLuint,
    }

    impl FramebufferBindings {
        pub(crate) fn capture<F: Fn(gl::GLenum) -> GLint>(get: F) -> FramebufferBindings {
            FramebufferBindings {
                draw: get(gl::DRAW_FRAMEBUFFER_BINDING) as GLuint,
                read: get(gl::READ_FRAMEBUFFER_BINDING) as GLuint,
            }
        }

        pub(crate) fn restore<F: FnMut(gl::GLenum, GLuint)>(&self, mut bind: F) {
            bind(gl::DRAW_FRAMEBUFFER, self.draw);
            bind(gl::READ_FRAMEBUFFER, self.read);
        }
    }

    fn gl_target(target: TextureTarget) -> gl::GLenum {
        match target {
            TextureTarget::Texture2D => gl::TEXTURE_2D,
            TextureTarget::Rectangle => gl::TEXTURE_RECTANGLE,
        }
    }

    impl GpuContext for GleamContext {
        fn create_render_target(&self, width: u32, height: u32) -> Result<RenderTarget, GpuResourceError> {
            let max_size = self.integer(gl::MAX_TEXTURE_SIZE).max(0) as u32;
            if width == 0 || height == 0 || width > max_size || height > max_size {
                return Err(GpuResourceError::InvalidDimensions(width, height));
            }
            let gl = &self.gl;

            let bindings = FramebufferBindings::capture(|name| self.integer(name));
            let current_texture = self.integer(gl::TEXTURE_BINDING_2D) as GLuint;
            let current_renderbuffer = self.integer(gl::RENDERBUFFER_BINDING) as GLuint;

            let fbo = gl.gen_framebuffers(1)[0];
            let color = gl.gen_textures(1)[0];
            let depth = gl.gen_renderbuffers(1)[0];

            gl.bind_texture(gl::TEXTURE_2D, color);
            gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl.tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            gl.tex_image_2d(gl::TEXTURE_2D,
                            0,
                            gl::RGBA8 as GLint,
                            width as GLint, height as GLint,
                            0,
                            gl::RGBA,
                            gl::UNSIGNED_BYTE,
                            None);

            gl.bind_renderbuffer(gl::RENDERBUFFER, depth);
            gl.renderbuffer_storage(gl::RENDERBUFFER, gl::DEPTH_COMPONENT24, width as GLint, height as GLint);

            // Only the draw binding is touched while attaching.
            gl.bind_framebuffer(gl::DRAW_FRAMEBUFFER, fbo);
            gl.framebuffer_texture_2d(gl::DRAW_FRAMEBUFFER, gl::COLOR_ATTACHMENT0, gl::TEXTURE_2D, color, 0);
            gl.framebuffer_renderbuffer(gl::DRAW_FRAMEBUFFER, gl::DEPTH_ATTACHMENT, gl::RENDERBUFFER, depth);
            let status = gl.check_frame_buffer_status(gl::DRAW_FRAMEBUFFER);

            bindings.restore(|target, fbo| gl.bind_framebuffer(target, fbo));
            gl.bind_texture(gl::TEXTURE_2D, current_texture);
            gl.bind_renderbuffer(gl::RENDERBUFFER, current_renderbuffer);

            let target = RenderTarget {
                fbo: fbo,
                depth: Some(depth),
                color: color,
                width: width,
                height: height,
            };
            if status != gl::FRAMEBUFFER_COMPLETE {
                self.destroy_render_target(&target);
                return Err(GpuResourceError::IncompleteFramebuffer(status));
            }
            debug!("Created {}x{} render target (fbo {}, color {})", width, height, fbo, color);
            Ok(target)
        }

        fn destroy_render_target(&self, target: &RenderTarget) {
            self.gl.delete_framebuffers(&[target.fbo]);
            self.gl.delete_textures(&[target.color]);
            if let Some(depth) = target.depth {
                self.gl.delete_renderbuffers(&[depth]);
            }
        }

        fn copy_texture(&self, copy: &TextureCopy) -> Result<(), GpuResourceError> {
            let (src_w, src_h) = (copy.source_size.0 as GLint, copy.source_size.1 as GLint);
            let (dst_w, dst_h) = (copy.destination_size.0 as GLint, copy.destination_size.1 as GLint);
            if src_w <= 0 || src_h <= 0 || dst_w <= 0 || dst_h <= 0 {
                return Err(GpuResourceError::InvalidDimensions(copy.destination_size.0, copy.destination_size.1));
            }
            let gl = &self.gl;

            // Save the current FBO bindings
            let bindings = FramebufferBindings::capture(|name| self.integer(name));
            let scissor = gl.is_enabled(gl::SCISSOR_TEST) != 0;

            let fbos = gl.gen_framebuffers(2);
            gl.bind_framebuffer(gl::READ_FRAMEBUFFER, fbos[0]);
            gl.framebuffer_texture_2d(gl::READ_FRAMEBUFFER,
                                      gl::COLOR_ATTACHMENT0,
                                      gl_target(copy.source_target),
                                      copy.source, 0);
            gl.bind_framebuffer(gl::DRAW_FRAMEBUFFER, fbos[1]);
            gl.framebuffer_texture_2d(gl::DRAW_FRAMEBUFFER,
                                      gl::COLOR_ATTACHMENT0,
                                      gl::TEXTURE_2D,
                                      copy.destination, 0);

            let status = gl.check_frame_buffer_status(gl::DRAW_FRAMEBUFFER);
            let result = if status == gl::FRAMEBUFFER_COMPLETE {
                if scissor {
                    gl.disable(gl::SCISSOR_TEST);
                }
                let (dst_y0, dst_y1) = if copy.flip_vertical { (dst_h, 0) } else { (0, dst_h) };
                gl.blit_framebuffer(0, 0, src_w, src_h,
                                    0, dst_y0, dst_w, dst_y1,
                                    gl::COLOR_BUFFER_BIT, gl::LINEAR);
                if scissor {
                    gl.enable(gl::SCISSOR_TEST);
                }
                Ok(())
            } else {
                Err(GpuResourceError::IncompleteFramebuffer(status))
            };

            // Restore the old framebuffers
            bindings.restore(|target, fbo| gl.bind_framebuffer(target, fbo));
            gl.delete_framebuffers(&fbos);
            result
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bindings_restore_read_and_draw_separately() {
            let bindings = FramebufferBindings::capture(|name| match name {
                gl::DRAW_FRAMEBUFFER_BINDING => 4,
                gl::READ_FRAMEBUFFER_BINDING => 9,
                _ => 0,
            });
            let mut bound = Vec::new();
            bindings.restore(|target, fbo| bound.push((target, fbo)));
            assert_eq!(bound, vec![(gl::DRAW_FRAMEBUFFER, 4), (gl::READ_FRAMEBUFFER, 9)]);
        }
    }
}
