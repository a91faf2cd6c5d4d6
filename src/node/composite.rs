use std::collections::BTreeMap;
use std::fmt;

use crate::{
    foundation::error::PrismResult,
    node::decl::NodeDecl,
    render::backend::{DrawCall, RenderTarget, Renderer},
    texture::params::PooledTexture,
};

/// Textures keyed by pin name.
pub type PinTextures = BTreeMap<String, PooledTexture>;

/// A unit of compositing work: declared pins plus a render operation.
///
/// The graph never looks past this contract. Implementations issue their GPU work through the
/// [`Renderer`] handed to [`CompositeNode::render`].
pub trait CompositeNode {
    /// Pin declarations. Must stay stable between [`crate::RenderGraph::update_links`] calls.
    fn decl(&self) -> &NodeDecl;

    /// Return `false` to leave input `pin` unwired. The graph reports it as unused.
    fn validate_input(&self, pin: &str) -> bool {
        let _ = pin;
        true
    }

    /// Render into the graph's depth-enabled shared framebuffer.
    fn uses_depth_buffer(&self) -> bool {
        false
    }

    /// Issue this node's draw work.
    ///
    /// `inputs` holds every input that produced a texture this frame; unbound or unsatisfied pins
    /// are absent. `outputs` is `None` when the node writes to the final target instead of pooled
    /// textures.
    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        inputs: &PinTextures,
        outputs: Option<&PinTextures>,
        target: RenderTarget<'_>,
    ) -> PrismResult<()>;
}

/// A node that issues a single draw pass labelled with its name.
#[derive(Clone, Debug)]
pub struct PassNode {
    decl: NodeDecl,
    depth: bool,
}

impl PassNode {
    /// Create a pass from its declaration.
    pub fn new(decl: NodeDecl) -> Self {
        Self { decl, depth: false }
    }

    /// Render with a depth buffer attached.
    pub fn with_depth_buffer(mut self) -> Self {
        self.depth = true;
        self
    }
}

impl CompositeNode for PassNode {
    fn decl(&self) -> &NodeDecl {
        &self.decl
    }

    fn uses_depth_buffer(&self) -> bool {
        self.depth
    }

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        inputs: &PinTextures,
        _outputs: Option<&PinTextures>,
        target: RenderTarget<'_>,
    ) -> PrismResult<()> {
        renderer.draw(&DrawCall {
            label: &self.decl.name,
            inputs,
            target,
        })
    }
}

/// A node whose render operation is a closure.
pub struct FnNode<F> {
    decl: NodeDecl,
    depth: bool,
    render: F,
}

impl<F> FnNode<F>
where
    F: FnMut(&mut dyn Renderer, &PinTextures, Option<&PinTextures>, RenderTarget<'_>) -> PrismResult<()>,
{
    /// Create a node from its declaration and render closure.
    pub fn new(decl: NodeDecl, render: F) -> Self {
        Self {
            decl,
            depth: false,
            render,
        }
    }

    /// Render with a depth buffer attached.
    pub fn with_depth_buffer(mut self) -> Self {
        self.depth = true;
        self
    }
}

impl<F> fmt::Debug for FnNode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNode")
            .field("decl", &self.decl)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<F> CompositeNode for FnNode<F>
where
    F: FnMut(&mut dyn Renderer, &PinTextures, Option<&PinTextures>, RenderTarget<'_>) -> PrismResult<()>,
{
    fn decl(&self) -> &NodeDecl {
        &self.decl
    }

    fn uses_depth_buffer(&self) -> bool {
        self.depth
    }

    fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        inputs: &PinTextures,
        outputs: Option<&PinTextures>,
        target: RenderTarget<'_>,
    ) -> PrismResult<()> {
        (self.render)(renderer, inputs, outputs, target)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/composite.rs"]
mod tests;
