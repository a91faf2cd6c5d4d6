use std::fmt;

use crate::foundation::core::{NodeId, Viewport};

/// A configuration problem found while wiring or rendering the graph.
///
/// Diagnostics never abort a frame: the graph renders what it can and reports the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// No node renders to the final target, so nothing was drawn.
    NoEndNodes,
    /// An input names an upstream node or output pin that does not exist (or is disabled).
    MissingPin {
        /// Consuming node.
        node: String,
        /// Consuming input pin.
        pin: String,
        /// Upstream node name as declared.
        upstream: String,
        /// Upstream output pin as declared.
        output: Option<String>,
    },
    /// The node rejected one of its declared inputs via `validate_input`.
    UnusedInput {
        /// Node name.
        node: String,
        /// Rejected input pin.
        pin: String,
    },
    /// An output was released more often than it was counted.
    ReferenceUnderflow {
        /// Producing node.
        node: String,
        /// Output pin.
        pin: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEndNodes => f.write_str("graph has no end nodes; nothing rendered"),
            Self::MissingPin {
                node,
                pin,
                upstream,
                output,
            } => match output {
                Some(out) => write!(f, "{node}.{pin}: pin {upstream}.{out} does not exist"),
                None => write!(f, "{node}.{pin}: node '{upstream}' has no usable output"),
            },
            Self::UnusedInput { node, pin } => write!(f, "pin {node}.{pin} not used"),
            Self::ReferenceUnderflow { node, pin } => {
                write!(f, "{node}.{pin} released more often than referenced")
            }
        }
    }
}

/// Result of [`crate::RenderGraph::update_links`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Number of input pins bound to an upstream output.
    pub links: usize,
    /// Problems found while wiring.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of one [`crate::RenderGraph::render`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Viewport the frame was rendered at.
    pub viewport: Viewport,
    /// Nodes evaluated as roots this frame.
    pub end_nodes: Vec<NodeId>,
    /// Nodes whose render ran, in execution order.
    pub rendered: Vec<NodeId>,
    /// `true` if the texture pool was cleared because the viewport changed.
    pub pool_cleared: bool,
    /// Configuration problems found this frame (including pending wiring diagnostics).
    pub diagnostics: Vec<Diagnostic>,
}

/// Notifications published on [`crate::RenderGraph::events_mut`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node is about to render (inputs not yet pulled).
    BeforeNodeRender {
        /// Node id.
        node: NodeId,
        /// Node name.
        name: String,
    },
    /// A node finished rendering.
    AfterNodeRender {
        /// Node id.
        node: NodeId,
        /// Node name.
        name: String,
    },
    /// The texture pool was cleared (viewport change or dispose).
    PoolCleared {
        /// Number of GPU textures disposed.
        disposed: usize,
    },
}
