use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    expression::SizeExpr,
    foundation::error::{PrismError, PrismResult},
    graph::render_graph::{RenderGraph, RenderGraphOpts},
    node::composite::{CompositeNode, PassNode},
    node::decl::{InputLink, NodeDecl, OutputDecl, SizeSpec},
    texture::params::ParamOverrides,
    texture::pool::TexturePoolOpts,
};

/// JSON description of a whole composite graph.
///
/// ```json
/// { "nodes": [
///     { "name": "scene", "type": "scene", "outputs": { "color": {} } },
///     { "name": "blur", "shader": "blur",
///       "inputs": { "texture": "scene" },
///       "outputs": { "color": { "width": "expr(width / 2)", "height": { "input": "texture", "scale": 0.5 } } } },
///     { "name": "out", "inputs": { "texture": { "node": "blur", "output": "color" } },
///       "render_to_screen": true } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphDesc {
    /// Texture pool options; overrides the options passed to [`GraphDesc::build`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<TexturePoolOpts>,
    /// Node descriptions.
    pub nodes: Vec<NodeDesc>,
}

/// One node of a [`GraphDesc`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDesc {
    /// Unique node name.
    pub name: String,
    /// Node kind, interpreted by the host's factory.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Shader reference, interpreted by the host's factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,
    /// Input pin -> upstream reference.
    #[serde(default)]
    pub inputs: BTreeMap<String, InputDesc>,
    /// Output pin declarations.
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputDesc>,
    /// Always evaluate this node.
    #[serde(default)]
    pub render_to_screen: bool,
    /// Free-form shader parameters, passed through to the factory.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

fn default_kind() -> String {
    "filter".to_owned()
}

fn default_scale() -> f32 {
    1.0
}

/// Upstream reference: a bare node name, or a node plus output pin.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum InputDesc {
    /// Default output of the named node.
    Node(String),
    /// Explicit node and pin.
    Link(InputLink),
}

impl From<&InputDesc> for InputLink {
    fn from(desc: &InputDesc) -> Self {
        match desc {
            InputDesc::Node(node) => InputLink::node(node.as_str()),
            InputDesc::Link(link) => link.clone(),
        }
    }
}

impl InputDesc {
    fn node(&self) -> &str {
        match self {
            Self::Node(node) => node,
            Self::Link(link) => &link.node,
        }
    }
}

/// One output dimension.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SizeDesc {
    /// Fixed pixel count.
    Absolute(u32),
    /// `expr(...)` over `width`, `height` and `dpr`.
    Expr(String),
    /// Fraction of a bound input.
    Input {
        /// Local input pin.
        input: String,
        /// Multiplier.
        #[serde(default = "default_scale")]
        scale: f32,
    },
}

/// Output pin description.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputDesc {
    /// Width; omitted inherits (or follows `scale`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<SizeDesc>,
    /// Height; omitted inherits (or follows `scale`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<SizeDesc>,
    /// Viewport multiplier for expression sizes; alone, sizes the output to `viewport × scale`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Texture overrides (`format`, `type`, filters, wraps, `use_mipmap`, `anisotropic`).
    #[serde(flatten)]
    pub params: ParamOverrides,
    /// Color attachment slot.
    pub attachment: u32,
    /// Retain across frames.
    pub keep_last_frame: bool,
    /// Serve last frame's texture once rendered.
    pub output_last_frame: bool,
    /// Excluded from linking.
    pub disabled: bool,
}

impl OutputDesc {
    fn size(&self, desc: Option<&SizeDesc>) -> PrismResult<Option<SizeSpec>> {
        let scale = self.scale.unwrap_or(1.0);
        Ok(match desc {
            Some(SizeDesc::Absolute(v)) => Some(SizeSpec::Absolute(*v)),
            Some(SizeDesc::Expr(src)) => Some(SizeSpec::Expr {
                expr: SizeExpr::parse(src)?,
                scale,
            }),
            Some(SizeDesc::Input { input, scale }) => {
                Some(SizeSpec::input(input.as_str(), *scale))
            }
            None => self.scale.map(SizeSpec::viewport),
        })
    }

    /// Convert to an [`OutputDecl`], parsing size expressions.
    pub fn to_decl(&self) -> PrismResult<OutputDecl> {
        Ok(OutputDecl {
            width: self.size(self.width.as_ref())?,
            height: self.size(self.height.as_ref())?,
            params: self.params,
            attachment: self.attachment,
            keep_last_frame: self.keep_last_frame,
            output_last_frame: self.output_last_frame,
            disabled: self.disabled,
        })
    }
}

impl NodeDesc {
    /// Convert to a [`NodeDecl`].
    pub fn to_decl(&self) -> PrismResult<NodeDecl> {
        let mut decl = NodeDecl::new(self.name.as_str());
        decl.render_to_screen = self.render_to_screen;
        for (pin, input) in &self.inputs {
            decl.inputs.insert(pin.clone(), InputLink::from(input));
        }
        for (pin, out) in &self.outputs {
            let out = out.to_decl().map_err(|e| {
                PrismError::config(format!("node '{}' output '{pin}': {e}", self.name))
            })?;
            decl.outputs.insert(pin.clone(), out);
        }
        Ok(decl)
    }
}

impl GraphDesc {
    /// Parse a description from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PrismResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PrismError::serde(format!("parse graph JSON: {e}")))
    }

    /// Parse a description from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PrismResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PrismError::config(format!("open graph JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse a description from a JSON string.
    pub fn from_json_str(s: &str) -> PrismResult<Self> {
        serde_json::from_str(s).map_err(|e| PrismError::serde(format!("parse graph JSON: {e}")))
    }

    /// Check names, references and size expressions.
    ///
    /// Dangling output pins are not checked here; the graph reports those as diagnostics when
    /// it wires itself.
    pub fn validate(&self) -> PrismResult<()> {
        if self.pool.is_some_and(|p| p.max_textures == 0) {
            return Err(PrismError::config("pool.max_textures must be > 0"));
        }
        let mut names = BTreeSet::new();
        for node in &self.nodes {
            if node.name.trim().is_empty() {
                return Err(PrismError::config("node name must be non-empty"));
            }
            if !names.insert(node.name.as_str()) {
                return Err(PrismError::config(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }
        for node in &self.nodes {
            for (pin, input) in &node.inputs {
                if !names.contains(input.node()) {
                    return Err(PrismError::config(format!(
                        "node '{}' input '{pin}' references unknown node '{}'",
                        node.name,
                        input.node()
                    )));
                }
            }
            for (pin, out) in &node.outputs {
                if let Some(scale) = out.scale
                    && (!scale.is_finite() || scale <= 0.0)
                {
                    return Err(PrismError::config(format!(
                        "node '{}' output '{pin}': scale must be finite and > 0",
                        node.name
                    )));
                }
            }
            node.to_decl()?;
        }
        Ok(())
    }

    /// Validate, then build a graph. `factory` supplies the render implementation for each node
    /// from its description and parsed declaration.
    pub fn build<F>(&self, opts: RenderGraphOpts, mut factory: F) -> PrismResult<RenderGraph>
    where
        F: FnMut(&NodeDesc, NodeDecl) -> PrismResult<Box<dyn CompositeNode>>,
    {
        self.validate()?;
        let mut graph = RenderGraph::new(RenderGraphOpts {
            pool: self.pool.unwrap_or(opts.pool),
        });
        for desc in &self.nodes {
            let node = factory(desc, desc.to_decl()?)?;
            if node.decl().name != desc.name {
                return Err(PrismError::config(format!(
                    "factory renamed node '{}' to '{}'",
                    desc.name,
                    node.decl().name
                )));
            }
            graph.add_node(node);
        }
        tracing::debug!(nodes = graph.len(), "graph built from description");
        Ok(graph)
    }

    /// Build a graph where every node is a [`PassNode`].
    pub fn build_passes(&self) -> PrismResult<RenderGraph> {
        self.build(RenderGraphOpts::default(), |_, decl| {
            Ok(Box::new(PassNode::new(decl)) as Box<dyn CompositeNode>)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
