//! The renderer capability consumed by the graph, and a headless implementation of it.

pub(crate) mod backend;
pub(crate) mod headless;
