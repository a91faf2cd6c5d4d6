pub(crate) mod node;
pub(crate) mod render_graph;
pub(crate) mod report;
