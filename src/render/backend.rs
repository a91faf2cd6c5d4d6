use smallvec::SmallVec;

use crate::{
    foundation::core::{TextureId, Viewport},
    foundation::error::PrismResult,
    node::composite::PinTextures,
    texture::params::{PooledTexture, TextureParams},
};

/// The rendering capability the graph drives.
///
/// Implemented by the host's GPU backend. The graph only needs viewport queries, texture
/// lifetime management and a way to hand draw instructions to the backend; everything else
/// (shaders, pipelines, command submission) stays behind this trait.
pub trait Renderer {
    /// Drawable width in pixels.
    fn width(&self) -> u32;

    /// Drawable height in pixels.
    fn height(&self) -> u32;

    /// Device pixel ratio.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Current viewport, as used for relative sizing and pool invalidation.
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width(),
            height: self.height(),
            dpr: self.device_pixel_ratio(),
        }
    }

    /// Create a GPU texture. Out-of-memory must be reported as
    /// [`crate::PrismError::ResourceExhausted`].
    fn create_texture(&mut self, params: &TextureParams) -> PrismResult<TextureId>;

    /// Destroy a GPU texture created by [`Renderer::create_texture`].
    fn dispose_texture(&mut self, id: TextureId);

    /// Execute one draw pass against `call.target`.
    fn draw(&mut self, call: &DrawCall<'_>) -> PrismResult<()>;
}

/// One draw instruction issued by a composite node.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Program or pass label; meaning is backend-defined.
    pub label: &'a str,
    /// Textures bound to the pass, keyed by sampler name.
    pub inputs: &'a PinTextures,
    /// Destination of the pass.
    pub target: RenderTarget<'a>,
}

/// Where a node's render writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderTarget<'a> {
    /// The default (window) framebuffer.
    Screen,
    /// An offscreen framebuffer: either the graph's shared one or the caller's final target.
    FrameBuffer(&'a FrameBuffer),
}

/// Framebuffer description: a set of color attachments plus an optional depth buffer.
///
/// The graph keeps two of these alive for its whole lifetime and re-attaches textures per
/// node, so backends can map each to a single long-lived GPU object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    depth_buffer: bool,
    attachments: SmallVec<[(u32, PooledTexture); 4]>,
}

impl FrameBuffer {
    /// Create a framebuffer with no attachments.
    pub fn new(depth_buffer: bool) -> Self {
        Self {
            depth_buffer,
            attachments: SmallVec::new(),
        }
    }

    /// Return `true` if the framebuffer owns a depth buffer.
    pub fn has_depth_buffer(&self) -> bool {
        self.depth_buffer
    }

    /// Attach `texture` to color slot `attachment`, replacing any previous texture there.
    pub fn attach(&mut self, texture: PooledTexture, attachment: u32) {
        match self.attachments.iter_mut().find(|(a, _)| *a == attachment) {
            Some(slot) => slot.1 = texture,
            None => {
                self.attachments.push((attachment, texture));
                self.attachments.sort_by_key(|(a, _)| *a);
            }
        }
    }

    /// Detach every texture.
    pub fn clear_textures(&mut self) {
        self.attachments.clear();
    }

    /// Texture at `attachment`, if any.
    pub fn attachment(&self, attachment: u32) -> Option<PooledTexture> {
        self.attachments
            .iter()
            .find(|(a, _)| *a == attachment)
            .map(|(_, t)| *t)
    }

    /// All attachments, ordered by slot.
    pub fn attachments(&self) -> &[(u32, PooledTexture)] {
        &self.attachments
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
