use std::collections::{HashMap, HashSet};

use crate::{
    foundation::core::TextureId,
    foundation::error::{PrismError, PrismResult},
    render::backend::Renderer,
    texture::params::{PooledTexture, TextureParams},
};

/// Pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TexturePoolOpts {
    /// Maximum number of GPU textures the pool may create before `allocate` fails.
    ///
    /// Demand is bounded by the number of concurrently live graph edges, so hitting this
    /// usually means textures are being leaked.
    pub max_textures: usize,
}

impl Default for TexturePoolOpts {
    fn default() -> Self {
        Self { max_textures: 1000 }
    }
}

/// Counters describing pool activity since construction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TexturePoolStats {
    /// GPU textures created through the renderer.
    pub created: u64,
    /// GPU textures disposed by [`TexturePool::clear`].
    pub disposed: u64,
    /// Successful `allocate` calls (fresh or recycled).
    pub allocations: u64,
    /// Successful `release` calls.
    pub releases: u64,
    /// Releases ignored because the texture was not on loan.
    pub rejected_releases: u64,
    /// Textures currently idle in a bucket.
    pub idle: usize,
    /// Textures currently lent out.
    pub on_loan: usize,
}

struct Bucket {
    key: TextureParams,
    idle: Vec<TextureId>,
}

/// Recycling allocator for render-target textures.
///
/// Keyed by [`TextureParams::pool_key`]. Textures are only ever destroyed by
/// [`TexturePool::clear`]; there is no eviction.
pub struct TexturePool {
    opts: TexturePoolOpts,
    stats: TexturePoolStats,

    bucket_idx_by_key: HashMap<TextureParams, usize>,
    buckets: Vec<Bucket>,
    lent: HashSet<TextureId>,
    created: Vec<TextureId>,
}

impl TexturePool {
    /// Create an empty pool.
    pub fn new(opts: TexturePoolOpts) -> Self {
        Self {
            opts,
            stats: TexturePoolStats::default(),
            bucket_idx_by_key: HashMap::new(),
            buckets: Vec::new(),
            lent: HashSet::new(),
            created: Vec::new(),
        }
    }

    /// Pool configuration.
    pub fn opts(&self) -> TexturePoolOpts {
        self.opts
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> TexturePoolStats {
        self.stats.clone()
    }

    /// Return `true` if `id` is currently lent out.
    pub fn is_on_loan(&self, id: TextureId) -> bool {
        self.lent.contains(&id)
    }

    /// Lend a texture matching `params`, creating one if no idle texture fits.
    pub fn allocate(
        &mut self,
        renderer: &mut dyn Renderer,
        params: &TextureParams,
    ) -> PrismResult<PooledTexture> {
        let key = params.pool_key();
        if let Some(&bi) = self.bucket_idx_by_key.get(&key)
            && let Some(id) = self.buckets[bi].idle.pop()
        {
            self.stats.idle = self.stats.idle.saturating_sub(1);
            return Ok(self.lend(id, params));
        }

        if self.created.len() >= self.opts.max_textures {
            return Err(PrismError::resource_exhausted(format!(
                "texture pool limit of {} textures reached",
                self.opts.max_textures
            )));
        }

        let id = renderer.create_texture(&key)?;
        self.created.push(id);
        self.stats.created = self.stats.created.saturating_add(1);
        tracing::trace!(texture = id.0, width = key.width, height = key.height, "created pooled texture");
        Ok(self.lend(id, params))
    }

    fn lend(&mut self, id: TextureId, params: &TextureParams) -> PooledTexture {
        self.lent.insert(id);
        self.stats.allocations = self.stats.allocations.saturating_add(1);
        self.stats.on_loan = self.lent.len();
        PooledTexture {
            id,
            params: *params,
        }
    }

    /// Return a lent texture to its bucket.
    ///
    /// Releasing a texture that is not on loan (double release, or a texture from another
    /// pool) is logged and ignored; returns `false` in that case.
    pub fn release(&mut self, texture: PooledTexture) -> bool {
        if !self.lent.remove(&texture.id) {
            self.stats.rejected_releases = self.stats.rejected_releases.saturating_add(1);
            tracing::warn!(
                texture = texture.id.0,
                "release of a texture that is not on loan from this pool; ignored"
            );
            return false;
        }

        let key = texture.params.pool_key();
        let bi = match self.bucket_idx_by_key.get(&key).copied() {
            Some(i) => i,
            None => {
                let i = self.buckets.len();
                self.buckets.push(Bucket {
                    key,
                    idle: Vec::new(),
                });
                self.bucket_idx_by_key.insert(key, i);
                i
            }
        };
        debug_assert_eq!(self.buckets[bi].key, key);
        self.buckets[bi].idle.push(texture.id);

        self.stats.releases = self.stats.releases.saturating_add(1);
        self.stats.idle = self.stats.idle.saturating_add(1);
        self.stats.on_loan = self.lent.len();
        true
    }

    /// Dispose every texture this pool created and forget all buckets.
    ///
    /// Callers must release all loans first; textures still on loan are disposed anyway and
    /// their handles become dangling. Returns the number of disposed textures.
    pub fn clear(&mut self, renderer: &mut dyn Renderer) -> usize {
        if !self.lent.is_empty() {
            tracing::warn!(
                on_loan = self.lent.len(),
                "clearing texture pool while textures are still on loan"
            );
        }
        let n = self.created.len();
        for id in self.created.drain(..) {
            renderer.dispose_texture(id);
        }
        self.bucket_idx_by_key.clear();
        self.buckets.clear();
        self.lent.clear();

        self.stats.disposed = self.stats.disposed.saturating_add(n as u64);
        self.stats.idle = 0;
        self.stats.on_loan = 0;
        tracing::debug!(disposed = n, "texture pool cleared");
        n
    }
}

impl Default for TexturePool {
    fn default() -> Self {
        Self::new(TexturePoolOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/pool.rs"]
mod tests;
