//! Texture creation parameters and the pool bucket key.

use crate::foundation::core::{TextureId, Viewport};

/// Pixel layout of a render target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Four channels.
    #[default]
    Rgba,
    /// Three channels.
    Rgb,
    /// Single alpha channel.
    Alpha,
    /// Single luminance channel.
    Luminance,
    /// Depth attachment.
    DepthComponent,
    /// Packed depth + stencil attachment.
    DepthStencil,
}

impl PixelFormat {
    /// Return `true` for depth (or depth-stencil) formats.
    pub fn is_depth(self) -> bool {
        matches!(self, Self::DepthComponent | Self::DepthStencil)
    }
}

/// Storage type of each channel.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TexelType {
    /// 8-bit normalized.
    #[default]
    UnsignedByte,
    /// 16-bit float.
    HalfFloat,
    /// 32-bit float.
    Float,
    /// 16-bit unsigned integer (depth).
    UnsignedShort,
    /// 32-bit unsigned integer (depth).
    UnsignedInt,
}

/// Minification/magnification filter.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Nearest texel.
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
    /// Nearest texel of the nearest mip.
    NearestMipmapNearest,
    /// Bilinear within the nearest mip.
    LinearMipmapNearest,
    /// Nearest texel, blended between mips.
    NearestMipmapLinear,
    /// Trilinear.
    LinearMipmapLinear,
}

impl Filter {
    /// Return `true` if the filter samples mip levels.
    pub fn uses_mipmap(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }

    /// Same filter without mip sampling.
    pub fn without_mipmap(self) -> Self {
        match self {
            Self::NearestMipmapNearest | Self::NearestMipmapLinear => Self::Nearest,
            Self::LinearMipmapNearest | Self::LinearMipmapLinear => Self::Linear,
            other => other,
        }
    }
}

/// Texture coordinate wrap mode.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    /// Clamp coordinates to the edge texel.
    #[default]
    ClampToEdge,
    /// Tile.
    Repeat,
    /// Tile, mirroring every other repetition.
    MirroredRepeat,
}

/// Full description of a render-target texture.
///
/// This is a value type: two params with the same fields describe interchangeable textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TextureParams {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Channel storage type.
    pub texel_type: TexelType,
    /// Minification filter.
    pub min_filter: Filter,
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Horizontal wrap mode.
    pub wrap_s: Wrap,
    /// Vertical wrap mode.
    pub wrap_t: Wrap,
    /// Whether a mip chain is generated.
    pub use_mipmap: bool,
    /// Anisotropic filtering level.
    pub anisotropic: u8,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            format: PixelFormat::Rgba,
            texel_type: TexelType::UnsignedByte,
            min_filter: Filter::LinearMipmapLinear,
            mag_filter: Filter::Linear,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
            use_mipmap: true,
            anisotropic: 1,
        }
    }
}

impl TextureParams {
    /// Default params with the given size.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Default params covering the viewport, at least 1×1 even for a collapsed viewport.
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self::sized(viewport.width.max(1), viewport.height.max(1))
    }

    /// Pixel area, used to pick the dominant input when inheriting params.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Return `true` if both dimensions are powers of two.
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    /// Bucket key used by the texture pool.
    ///
    /// Depth formats never carry mips. Textures without mips (or with non-power-of-two sizes)
    /// cannot use mip filters or repeat wrapping, so those settings are folded away; params that
    /// end up creating the same texture share a bucket.
    pub fn pool_key(&self) -> Self {
        let mut k = *self;
        if k.format.is_depth() {
            k.use_mipmap = false;
        }
        if !k.is_power_of_two() || !k.use_mipmap {
            k.min_filter = k.min_filter.without_mipmap();
            k.wrap_s = Wrap::ClampToEdge;
            k.wrap_t = Wrap::ClampToEdge;
        }
        k
    }
}

/// Optional per-output overrides applied on top of derived params.
///
/// Width and height are not part of this: sizes come from [`crate::SizeSpec`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    /// Pixel layout.
    pub format: Option<PixelFormat>,
    /// Channel storage type.
    #[serde(rename = "type")]
    pub texel_type: Option<TexelType>,
    /// Minification filter.
    pub min_filter: Option<Filter>,
    /// Magnification filter.
    pub mag_filter: Option<Filter>,
    /// Horizontal wrap mode.
    pub wrap_s: Option<Wrap>,
    /// Vertical wrap mode.
    pub wrap_t: Option<Wrap>,
    /// Whether a mip chain is generated.
    pub use_mipmap: Option<bool>,
    /// Anisotropic filtering level.
    pub anisotropic: Option<u8>,
}

impl ParamOverrides {
    /// Apply every set override to `base`.
    pub fn apply(&self, base: TextureParams) -> TextureParams {
        TextureParams {
            format: self.format.unwrap_or(base.format),
            texel_type: self.texel_type.unwrap_or(base.texel_type),
            min_filter: self.min_filter.unwrap_or(base.min_filter),
            mag_filter: self.mag_filter.unwrap_or(base.mag_filter),
            wrap_s: self.wrap_s.unwrap_or(base.wrap_s),
            wrap_t: self.wrap_t.unwrap_or(base.wrap_t),
            use_mipmap: self.use_mipmap.unwrap_or(base.use_mipmap),
            anisotropic: self.anisotropic.unwrap_or(base.anisotropic),
            ..base
        }
    }
}

/// A texture lent out by the [`crate::TexturePool`].
///
/// This is a plain handle; the GPU object itself is owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PooledTexture {
    /// Renderer-assigned identity.
    pub id: TextureId,
    /// Params the texture was created with (as requested, before key normalization).
    pub params: TextureParams,
}

#[cfg(test)]
#[path = "../../tests/unit/texture/params.rs"]
mod tests;
