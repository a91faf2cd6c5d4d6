use std::fmt;

use crate::{
    foundation::core::{NodeId, Viewport},
    foundation::error::PrismResult,
    foundation::events::EventChannel,
    graph::node::{FrameCtx, Link, NodeArena, RenderGraphNode, RenderState},
    graph::report::{Diagnostic, FrameReport, GraphEvent, UpdateReport},
    node::composite::CompositeNode,
    render::backend::{FrameBuffer, Renderer},
    texture::params::{PooledTexture, TextureParams},
    texture::pool::{TexturePool, TexturePoolOpts, TexturePoolStats},
};

/// Options for [`RenderGraph::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderGraphOpts {
    /// Options for the graph's texture pool.
    pub pool: TexturePoolOpts,
}

/// A pull-evaluated graph of composite nodes.
///
/// Each frame the graph finds its end nodes (nodes marked `render_to_screen`, or with no
/// consumers) and pulls them; every node pulls its inputs in turn and renders at most once.
/// Intermediate outputs are borrowed from a shared [`TexturePool`] and handed back as soon as
/// their last consumer has read them. Outputs marked `keep_last_frame` survive into the next
/// frame, which is how feedback loops (a node reading its own downstream) are resolved.
pub struct RenderGraph {
    nodes: NodeArena,
    next_id: u32,
    pool: TexturePool,
    shared: FrameBuffer,
    shared_depth: FrameBuffer,
    last_viewport: Option<Viewport>,
    params_viewport: Option<Viewport>,
    dirty: bool,
    pending: Vec<Diagnostic>,
    events: EventChannel<GraphEvent>,
}

impl RenderGraph {
    /// Create an empty graph.
    pub fn new(opts: RenderGraphOpts) -> Self {
        Self {
            nodes: NodeArena::default(),
            next_id: 0,
            pool: TexturePool::new(opts.pool),
            shared: FrameBuffer::new(false),
            shared_depth: FrameBuffer::new(true),
            last_viewport: None,
            params_viewport: None,
            dirty: false,
            pending: Vec::new(),
            events: EventChannel::new(),
        }
    }

    /// Add a node. A node whose name is already present is not added again; the existing id is
    /// returned.
    pub fn add_node(&mut self, node: Box<dyn CompositeNode>) -> NodeId {
        if let Some(id) = self.node_id(&node.decl().name) {
            tracing::debug!(name = %node.decl().name, "node already present");
            return id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.nodes.insert(id, RenderGraphNode::new(node));
        self.dirty = true;
        id
    }

    /// Remove a node, returning its textures to the pool. Returns `false` if absent.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        match self.nodes.nodes.remove(&id) {
            Some(mut node) => {
                node.release_retained(&mut self.pool);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Remove the node called `name`.
    pub fn remove_node_by_name(&mut self, name: &str) -> bool {
        self.node_id(name).is_some_and(|id| self.remove_node(id))
    }

    /// Id of the node called `name`.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .nodes
            .iter()
            .find(|(_, n)| n.name() == name)
            .map(|(id, _)| *id)
    }

    /// The composite node behind `id`.
    pub fn node(&self, id: NodeId) -> Option<&dyn CompositeNode> {
        self.nodes.get(id).map(|n| n.composite.as_ref())
    }

    /// Mutable access to a composite node. Marks the topology dirty, since the declaration may
    /// change.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn CompositeNode + 'static)> {
        let node = self.nodes.get_mut(id)?;
        self.dirty = true;
        Some(node.composite.as_mut())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.nodes.len()
    }

    /// Return `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.nodes.is_empty()
    }

    /// Force a rewire before the next render.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Drop every node's links and cached params. The next render rewires the graph.
    pub fn before_update(&mut self) {
        for node in self.nodes.nodes.values_mut() {
            node.before_update();
        }
        self.dirty = true;
    }

    /// Rewire the graph from the nodes' declarations.
    ///
    /// Inputs name their upstream node; an input without an output pin reads the upstream's
    /// default output. Inputs that cannot be resolved are left unbound and reported.
    #[tracing::instrument(skip(self), fields(nodes = self.nodes.nodes.len()))]
    pub fn update_links(&mut self) -> UpdateReport {
        self.before_update();
        let mut report = UpdateReport::default();
        let mut edges = Vec::new();

        for (&id, node) in &self.nodes.nodes {
            let decl = node.composite.decl();
            for (pin, link) in &decl.inputs {
                if !node.composite.validate_input(pin) {
                    tracing::warn!(node = %decl.name, pin = %pin, "pin not used");
                    report.diagnostics.push(Diagnostic::UnusedInput {
                        node: decl.name.clone(),
                        pin: pin.clone(),
                    });
                    continue;
                }
                let upstream = self.node_id(&link.node).and_then(|up_id| {
                    let up = self.nodes.get(up_id)?.composite.decl();
                    let out = match &link.output {
                        Some(out) => up
                            .outputs
                            .get(out)
                            .filter(|o| !o.disabled)
                            .map(|_| out.clone()),
                        None => up.first_output().map(str::to_owned),
                    }?;
                    Some(Link {
                        node: up_id,
                        pin: out,
                    })
                });
                match upstream {
                    Some(up) => edges.push((id, pin.clone(), up)),
                    None => {
                        let diag = Diagnostic::MissingPin {
                            node: decl.name.clone(),
                            pin: pin.clone(),
                            upstream: link.node.clone(),
                            output: link.output.clone(),
                        };
                        tracing::warn!("{diag}");
                        report.diagnostics.push(diag);
                    }
                }
            }
        }

        report.links = edges.len();
        for (id, pin, up) in edges {
            if let Some(producer) = self.nodes.get_mut(up.node) {
                producer.link_to(
                    up.pin.clone(),
                    Link {
                        node: id,
                        pin: pin.clone(),
                    },
                );
            }
            if let Some(consumer) = self.nodes.get_mut(id) {
                consumer.link_from(pin, up);
            }
        }
        self.dirty = false;
        tracing::debug!(links = report.links, "graph links updated");
        report
    }

    fn ensure_links(&mut self) {
        if self.dirty {
            let report = self.update_links();
            self.pending.extend(report.diagnostics);
        }
    }

    fn sync_params_viewport(&mut self, viewport: Viewport) {
        if self.params_viewport != Some(viewport) {
            for node in self.nodes.nodes.values_mut() {
                node.invalidate_params();
            }
            self.params_viewport = Some(viewport);
        }
    }

    /// Resolved texture params of output `pin` of node `id` at `viewport`.
    pub fn texture_params(
        &mut self,
        id: NodeId,
        pin: &str,
        viewport: Viewport,
    ) -> Option<TextureParams> {
        self.ensure_links();
        self.sync_params_viewport(viewport);
        self.nodes.texture_params(id, pin, viewport)
    }

    /// Nodes evaluated as roots: `render_to_screen` nodes and nodes nobody consumes.
    pub fn end_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .nodes
            .iter()
            .filter(|(_, n)| n.is_end_node())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Render one frame.
    ///
    /// Nodes that consume nothing downstream render into `final_target`, or the screen when it
    /// is `None`. Configuration problems are reported in the returned [`FrameReport`]; a texture
    /// allocation or backend failure aborts the frame after every borrowed texture has been
    /// handed back.
    #[tracing::instrument(skip(self, renderer, final_target))]
    pub fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        final_target: Option<&FrameBuffer>,
    ) -> PrismResult<FrameReport> {
        self.ensure_links();
        let viewport = renderer.viewport();
        let mut diagnostics = std::mem::take(&mut self.pending);

        let pool_cleared = self.last_viewport.is_some_and(|v| v != viewport);
        if pool_cleared {
            self.clear_pool(renderer);
        }
        self.last_viewport = Some(viewport);
        self.sync_params_viewport(viewport);

        let end_nodes = self.end_nodes();
        if end_nodes.is_empty() {
            tracing::warn!("graph has no end nodes");
            diagnostics.push(Diagnostic::NoEndNodes);
            return Ok(FrameReport {
                viewport,
                end_nodes,
                rendered: Vec::new(),
                pool_cleared,
                diagnostics,
            });
        }

        for node in self.nodes.nodes.values_mut() {
            node.before_render();
        }
        for &id in &end_nodes {
            self.nodes.count_reference(id, None);
        }

        let mut ctx = FrameCtx {
            renderer,
            pool: &mut self.pool,
            shared: &mut self.shared,
            shared_depth: &mut self.shared_depth,
            final_target,
            viewport,
            events: &mut self.events,
            rendered: Vec::new(),
            diagnostics: Vec::new(),
        };
        let mut result = Ok(());
        for &id in &end_nodes {
            if self.nodes.get(id).is_some_and(|n| n.state == RenderState::Rendered) {
                continue;
            }
            if let Err(e) = self.nodes.render(id, &mut ctx) {
                tracing::warn!(error = %e, "frame aborted");
                result = Err(e);
                break;
            }
        }

        for node in self.nodes.nodes.values_mut() {
            node.after_render(ctx.pool);
        }
        ctx.shared.clear_textures();
        ctx.shared_depth.clear_textures();
        result?;

        diagnostics.append(&mut ctx.diagnostics);
        Ok(FrameReport {
            viewport,
            end_nodes,
            rendered: ctx.rendered,
            pool_cleared,
            diagnostics,
        })
    }

    fn clear_pool(&mut self, renderer: &mut dyn Renderer) {
        for node in self.nodes.nodes.values_mut() {
            node.release_retained(&mut self.pool);
        }
        let disposed = self.pool.clear(renderer);
        tracing::debug!(disposed, "texture pool cleared");
        self.events.emit(&GraphEvent::PoolCleared { disposed });
    }

    /// Release every GPU texture the graph owns. The graph stays usable; the next render
    /// starts from an empty pool.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        self.clear_pool(renderer);
        self.last_viewport = None;
    }

    /// Texture pool counters.
    pub fn pool_stats(&self) -> TexturePoolStats {
        self.pool.stats()
    }

    /// Number of textures held across frames for `keep_last_frame` outputs.
    pub fn retained_textures(&self) -> usize {
        self.nodes.nodes.values().map(RenderGraphNode::retained).sum()
    }

    /// Last frame's texture of output `pin` of node `id`, if one is retained.
    pub fn last_frame_texture(&self, id: NodeId, pin: &str) -> Option<PooledTexture> {
        self.nodes.get(id)?.prev_output_texture(pin)
    }

    /// Node render notifications and pool clears.
    pub fn events_mut(&mut self) -> &mut EventChannel<GraphEvent> {
        &mut self.events
    }

    /// Viewport of the most recent render, reset by [`RenderGraph::dispose`].
    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }
}

impl fmt::Debug for RenderGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.nodes.nodes.values().map(RenderGraphNode::name).collect();
        f.debug_struct("RenderGraph")
            .field("nodes", &names)
            .field("pool", &self.pool.stats())
            .field("last_viewport", &self.last_viewport)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new(RenderGraphOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/render_graph.rs"]
mod tests;
