use crate::foundation::error::{PrismError, PrismResult};

/// Stable handle of a node inside a [`crate::RenderGraph`].
///
/// Ids are never reused within one graph, so a stale id simply stops resolving after the node
/// is removed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

/// Renderer-assigned identity of a GPU texture.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TextureId(pub u64);

/// Size and pixel density of the renderer's drawable area.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Drawable width in pixels.
    pub width: u32,
    /// Drawable height in pixels.
    pub height: u32,
    /// Device pixel ratio reported by the host.
    pub dpr: f32,
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(width: u32, height: u32, dpr: f32) -> PrismResult<Self> {
        if width == 0 || height == 0 {
            return Err(PrismError::validation("viewport width/height must be > 0"));
        }
        if !dpr.is_finite() || dpr <= 0.0 {
            return Err(PrismError::validation("viewport dpr must be finite and > 0"));
        }
        Ok(Self { width, height, dpr })
    }

    /// Pixel area of the viewport.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Convert a computed pixel extent to a usable texture dimension.
///
/// Non-finite values collapse to 1; everything else is rounded and clamped to `>= 1`.
pub(crate) fn to_extent(v: f64) -> u32 {
    if !v.is_finite() {
        return 1;
    }
    let r = v.round();
    if r < 1.0 {
        1
    } else if r > f64::from(u32::MAX) {
        u32::MAX
    } else {
        r as u32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
