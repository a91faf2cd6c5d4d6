//! Render-target texture descriptions and the recycling pool.

pub(crate) mod params;
pub(crate) mod pool;
