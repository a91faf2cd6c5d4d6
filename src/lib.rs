//! Prism is a pull-based composite render graph.
//!
//! A graph is a set of composite nodes, each declaring named input and output texture pins and
//! a render operation. Every frame the graph evaluates its end nodes, which pull their inputs
//! recursively; each node renders at most once per frame, its outputs come from a shared
//! [`TexturePool`], and every pooled texture goes back to the pool as soon as its last consumer
//! has read it.
//!
//! # Frame overview
//!
//! 1. **Wire**: declarations are linked by node name ([`RenderGraph::update_links`]).
//! 2. **Invalidate**: a viewport change clears the pool; stale sizes are never reused.
//! 3. **Count**: end nodes walk upstream to count how many consumers each output has.
//! 4. **Pull**: end nodes render, pulling inputs on demand; feedback edges read the previous
//!    frame's texture (a blank placeholder on the first frame).
//! 5. **Reclaim**: outputs are released or retained (`keep_last_frame`) for the next frame.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No GPU API**: all GPU work goes through the host's [`Renderer`]; [`HeadlessRenderer`] is a
//!   recording implementation for tests and dry runs.
//! - **No aborts on misconfiguration**: wiring problems become [`Diagnostic`]s, and only
//!   allocation or backend failures are returned as errors.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod expression;
mod foundation;
mod graph;
mod node;
mod render;
mod texture;

pub use config::model::{GraphDesc, InputDesc, NodeDesc, OutputDesc, SizeDesc};
pub use expression::SizeExpr;
pub use foundation::core::{NodeId, TextureId, Viewport};
pub use foundation::error::{PrismError, PrismResult};
pub use foundation::events::{EventChannel, SubscriptionId};
pub use graph::render_graph::{RenderGraph, RenderGraphOpts};
pub use graph::report::{Diagnostic, FrameReport, GraphEvent, UpdateReport};
pub use node::composite::{CompositeNode, FnNode, PassNode, PinTextures};
pub use node::decl::{Axis, InputLink, NodeDecl, OutputDecl, SizeSpec};
pub use render::backend::{DrawCall, FrameBuffer, RenderTarget, Renderer};
pub use render::headless::{DrawRecord, DrawTarget, HeadlessRenderer};
pub use texture::params::{
    Filter, ParamOverrides, PixelFormat, PooledTexture, TexelType, TextureParams, Wrap,
};
pub use texture::pool::{TexturePool, TexturePoolOpts, TexturePoolStats};
