use std::collections::BTreeMap;

use crate::{
    foundation::core::{TextureId, Viewport},
    foundation::error::{PrismError, PrismResult},
    render::backend::{DrawCall, RenderTarget, Renderer},
    texture::params::TextureParams,
};

/// Where a recorded draw wrote to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawTarget {
    /// The default framebuffer.
    Screen,
    /// An offscreen framebuffer with these `(slot, texture)` attachments.
    Attachments(Vec<(u32, TextureId)>),
}

/// A draw call captured by [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    /// Pass label.
    pub label: String,
    /// Bound inputs as `(sampler, texture)` in sampler order.
    pub inputs: Vec<(String, TextureId)>,
    /// Destination.
    pub target: DrawTarget,
}

/// GPU-less [`Renderer`] that tracks texture lifetimes and records draws.
///
/// Useful for dry-running a graph on a host without a device, and in tests.
#[derive(Debug)]
pub struct HeadlessRenderer {
    viewport: Viewport,
    next_texture: u64,
    live: BTreeMap<TextureId, TextureParams>,
    created: u64,
    disposed: u64,
    draws: Vec<DrawRecord>,
    fail_allocations: bool,
}

impl HeadlessRenderer {
    /// Create a renderer with the given drawable size and a device pixel ratio of 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_viewport(Viewport {
            width,
            height,
            dpr: 1.0,
        })
    }

    /// Create a renderer with an explicit viewport.
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_texture: 1,
            live: BTreeMap::new(),
            created: 0,
            disposed: 0,
            draws: Vec::new(),
            fail_allocations: false,
        }
    }

    /// Change the drawable size (simulates a window resize).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Change the device pixel ratio.
    pub fn set_device_pixel_ratio(&mut self, dpr: f32) {
        self.viewport.dpr = dpr;
    }

    /// Make every subsequent `create_texture` fail with an out-of-memory error.
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Params of a live texture.
    pub fn texture(&self, id: TextureId) -> Option<&TextureParams> {
        self.live.get(&id)
    }

    /// Number of textures created and not yet disposed.
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    /// Total textures ever created.
    pub fn created_textures(&self) -> u64 {
        self.created
    }

    /// Total textures disposed.
    pub fn disposed_textures(&self) -> u64 {
        self.disposed
    }

    /// Draws recorded since the last [`HeadlessRenderer::take_draws`].
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Drain recorded draws.
    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }
}

impl Renderer for HeadlessRenderer {
    fn width(&self) -> u32 {
        self.viewport.width
    }

    fn height(&self) -> u32 {
        self.viewport.height
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.viewport.dpr
    }

    fn create_texture(&mut self, params: &TextureParams) -> PrismResult<TextureId> {
        if self.fail_allocations {
            return Err(PrismError::resource_exhausted(format!(
                "out of memory creating {}x{} texture",
                params.width, params.height
            )));
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.live.insert(id, *params);
        self.created += 1;
        Ok(id)
    }

    fn dispose_texture(&mut self, id: TextureId) {
        if self.live.remove(&id).is_some() {
            self.disposed += 1;
        } else {
            tracing::warn!(texture = id.0, "dispose of unknown texture");
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> PrismResult<()> {
        let mut inputs = Vec::with_capacity(call.inputs.len());
        for (name, tex) in call.inputs {
            if !self.live.contains_key(&tex.id) {
                return Err(PrismError::backend(format!(
                    "pass '{}' samples disposed texture {} as '{name}'",
                    call.label, tex.id.0
                )));
            }
            inputs.push((name.clone(), tex.id));
        }
        let target = match call.target {
            RenderTarget::Screen => DrawTarget::Screen,
            RenderTarget::FrameBuffer(fb) => DrawTarget::Attachments(
                fb.attachments().iter().map(|(a, t)| (*a, t.id)).collect(),
            ),
        };
        self.draws.push(DrawRecord {
            label: call.label.to_owned(),
            inputs,
            target,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;
