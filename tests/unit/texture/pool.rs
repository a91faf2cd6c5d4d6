use super::*;
use crate::render::headless::HeadlessRenderer;

fn params(w: u32, h: u32) -> TextureParams {
    TextureParams::sized(w, h)
}

#[test]
fn released_texture_is_recycled_for_same_key() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let a = pool.allocate(&mut r, &params(64, 64)).unwrap();
    assert!(pool.release(a));
    let b = pool.allocate(&mut r, &params(64, 64)).unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(r.created_textures(), 1);
    let st = pool.stats();
    assert_eq!(st.allocations, 2);
    assert_eq!(st.releases, 1);
    assert_eq!(st.on_loan, 1);
}

#[test]
fn never_returns_a_texture_on_loan() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let a = pool.allocate(&mut r, &params(32, 32)).unwrap();
    let b = pool.allocate(&mut r, &params(32, 32)).unwrap();
    assert_ne!(a.id, b.id);
    assert!(pool.is_on_loan(a.id));
    assert!(pool.is_on_loan(b.id));
}

#[test]
fn different_keys_use_different_buckets() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let a = pool.allocate(&mut r, &params(32, 32)).unwrap();
    pool.release(a);
    let b = pool.allocate(&mut r, &params(16, 16)).unwrap();
    assert_ne!(a.id, b.id);

    let half = TextureParams {
        texel_type: crate::texture::params::TexelType::HalfFloat,
        ..params(32, 32)
    };
    let c = pool.allocate(&mut r, &half).unwrap();
    assert_ne!(a.id, c.id);
}

#[test]
fn recycled_texture_reports_requested_params() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let npot_mip = TextureParams {
        min_filter: crate::texture::params::Filter::LinearMipmapLinear,
        ..params(30, 30)
    };
    let npot_plain = TextureParams {
        min_filter: crate::texture::params::Filter::Linear,
        ..params(30, 30)
    };
    let a = pool.allocate(&mut r, &npot_mip).unwrap();
    pool.release(a);
    let b = pool.allocate(&mut r, &npot_plain).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(b.params, npot_plain);
}

#[test]
fn double_release_is_ignored() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let a = pool.allocate(&mut r, &params(8, 8)).unwrap();
    assert!(pool.release(a));
    assert!(!pool.release(a));

    let st = pool.stats();
    assert_eq!(st.releases, 1);
    assert_eq!(st.rejected_releases, 1);
    assert_eq!(st.idle, 1);

    // The bucket holds the texture once, so two allocations cannot alias it.
    let b = pool.allocate(&mut r, &params(8, 8)).unwrap();
    let c = pool.allocate(&mut r, &params(8, 8)).unwrap();
    assert_ne!(b.id, c.id);
}

#[test]
fn foreign_texture_release_is_ignored() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();
    let stranger = PooledTexture {
        id: TextureId(999),
        params: params(8, 8),
    };
    assert!(!pool.release(stranger));
    assert_eq!(pool.stats().idle, 0);
    let a = pool.allocate(&mut r, &params(8, 8)).unwrap();
    assert_ne!(a.id, stranger.id);
}

#[test]
fn clear_disposes_everything_created() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::default();

    let a = pool.allocate(&mut r, &params(8, 8)).unwrap();
    let b = pool.allocate(&mut r, &params(16, 16)).unwrap();
    pool.release(a);
    pool.release(b);

    assert_eq!(pool.clear(&mut r), 2);
    assert_eq!(r.live_textures(), 0);
    let st = pool.stats();
    assert_eq!(st.disposed, 2);
    assert_eq!(st.idle, 0);

    let c = pool.allocate(&mut r, &params(8, 8)).unwrap();
    assert_ne!(c.id, a.id);
    assert_ne!(c.id, b.id);
}

#[test]
fn limit_is_resource_exhaustion() {
    let mut r = HeadlessRenderer::new(64, 64);
    let mut pool = TexturePool::new(TexturePoolOpts { max_textures: 2 });

    let a = pool.allocate(&mut r, &params(8, 8)).unwrap();
    let _b = pool.allocate(&mut r, &params(8, 8)).unwrap();
    let err = pool.allocate(&mut r, &params(8, 8)).unwrap_err();
    assert!(matches!(err, PrismError::ResourceExhausted(_)));

    // Recycling still works at the limit.
    pool.release(a);
    assert!(pool.allocate(&mut r, &params(8, 8)).is_ok());
}

#[test]
fn renderer_failure_propagates() {
    let mut r = HeadlessRenderer::new(64, 64);
    r.set_fail_allocations(true);
    let mut pool = TexturePool::default();
    let err = pool.allocate(&mut r, &params(8, 8)).unwrap_err();
    assert!(matches!(err, PrismError::ResourceExhausted(_)));
    assert_eq!(pool.stats().allocations, 0);
}
