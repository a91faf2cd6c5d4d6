//! Per-node frame state and the recursive pull evaluation.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::{
    foundation::core::{NodeId, Viewport},
    foundation::error::PrismResult,
    foundation::events::EventChannel,
    graph::report::{Diagnostic, GraphEvent},
    node::composite::{CompositeNode, PinTextures},
    node::decl::{Axis, OutputDecl},
    render::backend::{FrameBuffer, RenderTarget, Renderer},
    texture::params::{PooledTexture, TextureParams},
    texture::pool::TexturePool,
};

/// One end of a wired edge: a node and one of its pins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) node: NodeId,
    pub(crate) pin: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderState {
    Idle,
    Rendering,
    Rendered,
}

/// A composite node plus everything the graph tracks about it.
pub(crate) struct RenderGraphNode {
    pub(crate) composite: Box<dyn CompositeNode>,
    /// Input pin -> upstream output.
    pub(crate) inputs: BTreeMap<String, Link>,
    /// Output pin -> downstream inputs. Only linked outputs have an entry.
    pub(crate) outputs: BTreeMap<String, SmallVec<[Link; 2]>>,
    output_textures: BTreeMap<String, PooledTexture>,
    prev_output_textures: BTreeMap<String, PooledTexture>,
    output_references: BTreeMap<String, u32>,
    texture_params: BTreeMap<String, TextureParams>,
    pub(crate) state: RenderState,
    resolving_params: bool,
    counted: bool,
}

impl RenderGraphNode {
    pub(crate) fn new(composite: Box<dyn CompositeNode>) -> Self {
        Self {
            composite,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            output_textures: BTreeMap::new(),
            prev_output_textures: BTreeMap::new(),
            output_references: BTreeMap::new(),
            texture_params: BTreeMap::new(),
            state: RenderState::Idle,
            resolving_params: false,
            counted: false,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.composite.decl().name
    }

    fn output_decl(&self, pin: &str) -> Option<&OutputDecl> {
        self.composite
            .decl()
            .outputs
            .get(pin)
            .filter(|o| !o.disabled)
    }

    /// End nodes are evaluated as roots every frame.
    pub(crate) fn is_end_node(&self) -> bool {
        self.composite.decl().render_to_screen || self.outputs.is_empty()
    }

    /// Drop links and cached params ahead of rewiring.
    pub(crate) fn before_update(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.texture_params.clear();
    }

    pub(crate) fn invalidate_params(&mut self) {
        self.texture_params.clear();
    }

    pub(crate) fn link_from(&mut self, pin: String, upstream: Link) {
        self.inputs.insert(pin, upstream);
    }

    pub(crate) fn link_to(&mut self, pin: String, downstream: Link) {
        self.outputs.entry(pin).or_default().push(downstream);
    }

    /// Start-of-frame reset.
    pub(crate) fn before_render(&mut self) {
        self.state = RenderState::Idle;
        self.counted = false;
        self.output_references.clear();
        for pin in self.outputs.keys() {
            self.output_references.insert(pin.clone(), 0);
        }
    }

    /// End-of-frame cleanup: every texture still bound to an output is kept or released.
    pub(crate) fn after_render(&mut self, pool: &mut TexturePool) {
        let pins: Vec<String> = self.output_textures.keys().cloned().collect();
        for pin in pins {
            self.finalize_output(&pin, pool);
        }
        if self.state == RenderState::Rendering {
            self.state = RenderState::Idle;
        }
    }

    /// Hand every texture this node holds back to the pool.
    pub(crate) fn release_retained(&mut self, pool: &mut TexturePool) {
        for (_, tex) in std::mem::take(&mut self.output_textures) {
            pool.release(tex);
        }
        for (_, tex) in std::mem::take(&mut self.prev_output_textures) {
            pool.release(tex);
        }
    }

    /// Number of textures kept across frames.
    pub(crate) fn retained(&self) -> usize {
        self.prev_output_textures.len()
    }

    pub(crate) fn prev_output_texture(&self, pin: &str) -> Option<PooledTexture> {
        self.prev_output_textures.get(pin).copied()
    }

    fn retains(&self, pin: &str) -> bool {
        self.composite
            .decl()
            .outputs
            .get(pin)
            .is_some_and(|o| o.keep_last_frame || o.output_last_frame)
    }

    /// Keep the current texture of `pin` as last frame's, or return it to the pool.
    fn finalize_output(&mut self, pin: &str, pool: &mut TexturePool) {
        let Some(tex) = self.output_textures.remove(pin) else {
            return;
        };
        if self.retains(pin) {
            if let Some(old) = self.prev_output_textures.insert(pin.to_owned(), tex) {
                pool.release(old);
            }
        } else {
            pool.release(tex);
        }
    }
}

/// Everything a frame's pull evaluation needs besides the nodes themselves.
pub(crate) struct FrameCtx<'a> {
    pub(crate) renderer: &'a mut dyn Renderer,
    pub(crate) pool: &'a mut TexturePool,
    pub(crate) shared: &'a mut FrameBuffer,
    pub(crate) shared_depth: &'a mut FrameBuffer,
    pub(crate) final_target: Option<&'a FrameBuffer>,
    pub(crate) viewport: Viewport,
    pub(crate) events: &'a mut EventChannel<GraphEvent>,
    pub(crate) rendered: Vec<NodeId>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// The graph's node storage. Recursive operations go through here so a node can reach its
/// neighbours by id.
#[derive(Default)]
pub(crate) struct NodeArena {
    pub(crate) nodes: BTreeMap<NodeId, RenderGraphNode>,
}

impl NodeArena {
    pub(crate) fn get(&self, id: NodeId) -> Option<&RenderGraphNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut RenderGraphNode> {
        self.nodes.get_mut(&id)
    }

    /// Memoized params of output `pin` of node `id`.
    ///
    /// Explicit sizes win. Otherwise the size (and format) comes from the bound input with the
    /// largest area, falling back to the viewport when there is none. Overrides are applied on
    /// top. An input whose lookup re-enters a node already being resolved is skipped.
    pub(crate) fn texture_params(
        &mut self,
        id: NodeId,
        pin: &str,
        viewport: Viewport,
    ) -> Option<TextureParams> {
        let node = self.nodes.get(&id)?;
        if let Some(p) = node.texture_params.get(pin) {
            return Some(*p);
        }
        if node.resolving_params {
            tracing::trace!(node = node.name(), pin, "cyclic params lookup skipped");
            return None;
        }
        let out = node.composite.decl().outputs.get(pin)?.clone();
        let inputs: Vec<(String, Link)> = node
            .inputs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        self.nodes.get_mut(&id)?.resolving_params = true;

        let mut by_pin = BTreeMap::new();
        let mut derived: Option<TextureParams> = None;
        let mut largest = 0;
        for (input_pin, link) in inputs {
            if let Some(p) = self.texture_params(link.node, &link.pin, viewport) {
                if p.area() > largest {
                    largest = p.area();
                    derived = Some(p);
                }
                by_pin.insert(input_pin, p);
            }
        }

        let base = derived.unwrap_or_else(|| TextureParams::for_viewport(viewport));
        let mut params = out.params.apply(base);
        let mut lookup = |p: &str| by_pin.get(p).copied();
        if let Some(w) = out
            .width
            .as_ref()
            .and_then(|s| s.resolve(Axis::Width, viewport, &mut lookup))
        {
            params.width = w;
        }
        if let Some(h) = out
            .height
            .as_ref()
            .and_then(|s| s.resolve(Axis::Height, viewport, &mut lookup))
        {
            params.height = h;
        }

        let node = self.nodes.get_mut(&id)?;
        node.resolving_params = false;
        node.texture_params.insert(pin.to_owned(), params);
        Some(params)
    }

    /// Walk upstream from `id`, counting one reference per consuming edge.
    ///
    /// Each node's inputs are walked once per frame, so cycles terminate and diamonds count
    /// every edge exactly once.
    pub(crate) fn count_reference(&mut self, id: NodeId, pin: Option<&str>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if let Some(pin) = pin {
            *node.output_references.entry(pin.to_owned()).or_insert(0) += 1;
        }
        if node.counted {
            return;
        }
        node.counted = true;
        let upstream: Vec<Link> = node.inputs.values().cloned().collect();
        for link in upstream {
            self.count_reference(link.node, Some(&link.pin));
        }
    }

    /// A consumer finished reading output `pin` of node `id`.
    pub(crate) fn release_reference(&mut self, id: NodeId, pin: &str, ctx: &mut FrameCtx<'_>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let remaining = match node.output_references.get_mut(pin) {
            Some(n) if *n > 0 => {
                *n -= 1;
                *n
            }
            _ => {
                tracing::warn!(node = node.name(), pin, "reference released more than counted");
                ctx.diagnostics.push(Diagnostic::ReferenceUnderflow {
                    node: node.name().to_owned(),
                    pin: pin.to_owned(),
                });
                return;
            }
        };
        // A node still rendering reclaims its own outputs once it is done.
        if remaining == 0 && node.state == RenderState::Rendered {
            node.finalize_output(pin, ctx.pool);
        }
    }

    /// Pull output `pin` of node `id`, rendering the node first if needed.
    ///
    /// Returns `None` for unknown or disabled pins, or when the node produced nothing for `pin`.
    pub(crate) fn render_and_output_texture(
        &mut self,
        id: NodeId,
        pin: &str,
        ctx: &mut FrameCtx<'_>,
    ) -> PrismResult<Option<PooledTexture>> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(None);
        };
        let Some(out) = node.output_decl(pin) else {
            return Ok(None);
        };
        let last_frame = out.output_last_frame;
        match node.state {
            RenderState::Rendered if !last_frame => Ok(node.output_textures.get(pin).copied()),
            RenderState::Rendered | RenderState::Rendering => {
                self.prev_or_placeholder(id, pin, ctx).map(Some)
            }
            RenderState::Idle => {
                let pins: Vec<String> = node.composite.decl().outputs.keys().cloned().collect();
                for p in &pins {
                    self.texture_params(id, p, ctx.viewport);
                }
                self.render(id, ctx)?;
                Ok(self
                    .nodes
                    .get(&id)
                    .and_then(|n| n.output_textures.get(pin).copied()))
            }
        }
    }

    /// Last frame's texture for `pin`, allocating a blank one on the first frame.
    fn prev_or_placeholder(
        &mut self,
        id: NodeId,
        pin: &str,
        ctx: &mut FrameCtx<'_>,
    ) -> PrismResult<PooledTexture> {
        if let Some(tex) = self.nodes.get(&id).and_then(|n| n.prev_output_texture(pin)) {
            return Ok(tex);
        }
        let params = self
            .texture_params(id, pin, ctx.viewport)
            .unwrap_or_else(|| TextureParams::for_viewport(ctx.viewport));
        let tex = ctx.pool.allocate(&mut *ctx.renderer, &params)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            tracing::debug!(
                node = node.name(),
                pin,
                texture = tex.id.0,
                "placeholder for last frame"
            );
            node.prev_output_textures.insert(pin.to_owned(), tex);
        }
        Ok(tex)
    }

    /// Render node `id` once: pull inputs, bind outputs, run the composite, release inputs.
    ///
    /// A node with linked outputs renders offscreen into pooled textures attached to a shared
    /// framebuffer. Otherwise it renders into the caller's final target (or the screen).
    pub(crate) fn render(&mut self, id: NodeId, ctx: &mut FrameCtx<'_>) -> PrismResult<()> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(());
        };
        node.state = RenderState::Rendering;
        let name = node.name().to_owned();
        let inputs: Vec<(String, Link)> = node
            .inputs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let linked: Vec<String> = node.outputs.keys().cloned().collect();
        ctx.events.emit(&GraphEvent::BeforeNodeRender {
            node: id,
            name: name.clone(),
        });

        let mut input_textures = PinTextures::new();
        for (pin, link) in &inputs {
            if let Some(tex) = self.render_and_output_texture(link.node, &link.pin, ctx)? {
                input_textures.insert(pin.clone(), tex);
            }
        }

        let mut params = Vec::with_capacity(linked.len());
        for pin in &linked {
            let p = self
                .texture_params(id, pin, ctx.viewport)
                .unwrap_or_else(|| TextureParams::for_viewport(ctx.viewport));
            params.push((pin, p));
        }

        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(());
        };
        if linked.is_empty() {
            let target = match ctx.final_target {
                Some(fb) => RenderTarget::FrameBuffer(fb),
                None => RenderTarget::Screen,
            };
            node.composite
                .render(&mut *ctx.renderer, &input_textures, None, target)?;
        } else {
            let fb = if node.composite.uses_depth_buffer() {
                &mut *ctx.shared_depth
            } else {
                &mut *ctx.shared
            };
            fb.clear_textures();
            let mut outputs = PinTextures::new();
            for (pin, p) in params {
                let tex = ctx.pool.allocate(&mut *ctx.renderer, &p)?;
                node.output_textures.insert(pin.clone(), tex);
                outputs.insert(pin.clone(), tex);
                let attachment = node
                    .composite
                    .decl()
                    .outputs
                    .get(pin)
                    .map_or(0, |o| o.attachment);
                fb.attach(tex, attachment);
            }
            node.composite.render(
                &mut *ctx.renderer,
                &input_textures,
                Some(&outputs),
                RenderTarget::FrameBuffer(fb),
            )?;
        }

        for (_, link) in &inputs {
            self.release_reference(link.node, &link.pin, ctx);
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.state = RenderState::Rendered;
            let unused: Vec<String> = node
                .output_textures
                .keys()
                .filter(|p| node.output_references.get(*p).copied().unwrap_or(0) == 0)
                .cloned()
                .collect();
            for pin in unused {
                node.finalize_output(&pin, ctx.pool);
            }
        }
        ctx.rendered.push(id);
        ctx.events.emit(&GraphEvent::AfterNodeRender { node: id, name });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/node.rs"]
mod tests;
