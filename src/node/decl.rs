//! Declarations a composite node exposes to the graph.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{
    expression::SizeExpr,
    foundation::core::{Viewport, to_extent},
    texture::params::{ParamOverrides, TextureParams},
};

/// Reference from an input pin to an upstream node's output pin.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputLink {
    /// Upstream node name.
    pub node: String,
    /// Upstream output pin; `None` selects [`NodeDecl::first_output`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl InputLink {
    /// Link to the first output of `node`.
    pub fn node(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            output: None,
        }
    }

    /// Link to a specific output pin of `node`.
    pub fn pin(node: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            output: Some(output.into()),
        }
    }
}

impl From<&str> for InputLink {
    fn from(node: &str) -> Self {
        Self::node(node)
    }
}

/// Axis a [`SizeSpec`] is resolved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal extent.
    Width,
    /// Vertical extent.
    Height,
}

/// How one dimension of an output texture is computed.
#[derive(Clone)]
pub enum SizeSpec {
    /// Fixed pixel count.
    Absolute(u32),
    /// Fraction of the renderer viewport along the same axis.
    Viewport {
        /// Multiplier applied to the viewport extent.
        scale: f32,
    },
    /// Fraction of the texture bound to input `pin`, along the same axis.
    Input {
        /// Local input pin name.
        pin: String,
        /// Multiplier applied to the input extent.
        scale: f32,
    },
    /// Arithmetic over `width`, `height` (viewport × `scale`) and `dpr`.
    Expr {
        /// Parsed expression.
        expr: SizeExpr,
        /// Multiplier applied to the viewport before evaluation.
        scale: f32,
    },
    /// Host-provided function of the viewport.
    Func(Arc<dyn Fn(Viewport) -> u32 + Send + Sync>),
}

impl SizeSpec {
    /// Shorthand for [`SizeSpec::Viewport`].
    pub fn viewport(scale: f32) -> Self {
        Self::Viewport { scale }
    }

    /// Shorthand for [`SizeSpec::Input`].
    pub fn input(pin: impl Into<String>, scale: f32) -> Self {
        Self::Input {
            pin: pin.into(),
            scale,
        }
    }

    /// Wrap a host function.
    pub fn func(f: impl Fn(Viewport) -> u32 + Send + Sync + 'static) -> Self {
        Self::Func(Arc::new(f))
    }

    /// Resolve to a pixel extent.
    ///
    /// `input` looks up the params of a bound input pin. Returns `None` when the size depends on
    /// an input that is not bound or whose params are unavailable, or when an expression cannot
    /// be evaluated; the caller then inherits the size instead.
    pub(crate) fn resolve(
        &self,
        axis: Axis,
        viewport: Viewport,
        input: &mut dyn FnMut(&str) -> Option<TextureParams>,
    ) -> Option<u32> {
        let along = |w: u32, h: u32| match axis {
            Axis::Width => f64::from(w),
            Axis::Height => f64::from(h),
        };
        match self {
            Self::Absolute(v) => Some((*v).max(1)),
            Self::Viewport { scale } => Some(to_extent(
                along(viewport.width, viewport.height) * f64::from(*scale),
            )),
            Self::Input { pin, scale } => {
                let p = input(pin)?;
                Some(to_extent(along(p.width, p.height) * f64::from(*scale)))
            }
            Self::Expr { expr, scale } => {
                let s = f64::from(*scale);
                match expr.eval(
                    f64::from(viewport.width) * s,
                    f64::from(viewport.height) * s,
                    f64::from(viewport.dpr),
                ) {
                    Ok(v) => Some(to_extent(v)),
                    Err(e) => {
                        tracing::warn!(error = %e, "size expression failed; inheriting size");
                        None
                    }
                }
            }
            Self::Func(f) => Some(f(viewport).max(1)),
        }
    }
}

impl fmt::Debug for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(v) => f.debug_tuple("Absolute").field(v).finish(),
            Self::Viewport { scale } => f.debug_struct("Viewport").field("scale", scale).finish(),
            Self::Input { pin, scale } => f
                .debug_struct("Input")
                .field("pin", pin)
                .field("scale", scale)
                .finish(),
            Self::Expr { expr, scale } => f
                .debug_struct("Expr")
                .field("expr", expr)
                .field("scale", scale)
                .finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<u32> for SizeSpec {
    fn from(v: u32) -> Self {
        Self::Absolute(v)
    }
}

/// Declaration of one output pin.
#[derive(Clone, Debug, Default)]
pub struct OutputDecl {
    /// Width rule; `None` inherits.
    pub width: Option<SizeSpec>,
    /// Height rule; `None` inherits.
    pub height: Option<SizeSpec>,
    /// Non-size texture overrides.
    pub params: ParamOverrides,
    /// Color attachment slot in the shared framebuffer.
    pub attachment: u32,
    /// Retain the texture after the frame so cyclic readers can use it next frame.
    pub keep_last_frame: bool,
    /// Serve last frame's texture to consumers that pull after this node rendered.
    pub output_last_frame: bool,
    /// Excluded from linking and never allocated.
    pub disabled: bool,
}

impl OutputDecl {
    /// Output that inherits size and params from its inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both dimensions.
    pub fn size(mut self, width: impl Into<SizeSpec>, height: impl Into<SizeSpec>) -> Self {
        self.width = Some(width.into());
        self.height = Some(height.into());
        self
    }

    /// Size both dimensions as a fraction of the viewport.
    pub fn viewport_scale(self, scale: f32) -> Self {
        self.size(SizeSpec::viewport(scale), SizeSpec::viewport(scale))
    }

    /// Size both dimensions as a fraction of input `pin`.
    pub fn input_scale(self, pin: &str, scale: f32) -> Self {
        self.size(SizeSpec::input(pin, scale), SizeSpec::input(pin, scale))
    }

    /// Set texture overrides.
    pub fn params(mut self, params: ParamOverrides) -> Self {
        self.params = params;
        self
    }

    /// Set the color attachment slot.
    pub fn attachment(mut self, slot: u32) -> Self {
        self.attachment = slot;
        self
    }

    /// Mark the output as retained across frames.
    pub fn keep_last_frame(mut self) -> Self {
        self.keep_last_frame = true;
        self
    }

    /// Mark the output as serving the previous frame once rendered.
    pub fn output_last_frame(mut self) -> Self {
        self.output_last_frame = true;
        self
    }

    /// Mark the output as disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Everything the graph reads from a composite node.
#[derive(Clone, Debug, Default)]
pub struct NodeDecl {
    /// Unique node name, used to resolve [`InputLink`]s.
    pub name: String,
    /// Input pins and where they read from.
    pub inputs: BTreeMap<String, InputLink>,
    /// Output pins.
    pub outputs: BTreeMap<String, OutputDecl>,
    /// Always evaluate this node, even if nothing consumes it.
    pub render_to_screen: bool,
}

impl NodeDecl {
    /// Declaration with no pins.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an input pin.
    pub fn input(mut self, pin: impl Into<String>, link: impl Into<InputLink>) -> Self {
        self.inputs.insert(pin.into(), link.into());
        self
    }

    /// Add an output pin.
    pub fn output(mut self, pin: impl Into<String>, decl: OutputDecl) -> Self {
        self.outputs.insert(pin.into(), decl);
        self
    }

    /// Mark the node as a terminal.
    pub fn render_to_screen(mut self) -> Self {
        self.render_to_screen = true;
        self
    }

    /// Default output pin, used when an [`InputLink`] names no pin: the first enabled output in
    /// name order.
    pub fn first_output(&self) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(_, o)| !o.disabled)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/decl.rs"]
mod tests;
