use super::*;

#[test]
fn npot_key_drops_mip_filters_and_repeat() {
    let p = TextureParams {
        wrap_s: Wrap::Repeat,
        wrap_t: Wrap::MirroredRepeat,
        ..TextureParams::sized(100, 64)
    };
    let k = p.pool_key();
    assert_eq!(k.min_filter, Filter::Linear);
    assert_eq!(k.wrap_s, Wrap::ClampToEdge);
    assert_eq!(k.wrap_t, Wrap::ClampToEdge);
    assert_eq!(k.width, 100);
    assert_eq!(k.height, 64);
}

#[test]
fn pot_key_with_mips_is_untouched() {
    let p = TextureParams {
        wrap_s: Wrap::Repeat,
        ..TextureParams::sized(256, 128)
    };
    assert_eq!(p.pool_key(), p);
}

#[test]
fn depth_formats_never_use_mips() {
    let p = TextureParams {
        format: PixelFormat::DepthComponent,
        min_filter: Filter::NearestMipmapLinear,
        ..TextureParams::sized(256, 256)
    };
    let k = p.pool_key();
    assert!(!k.use_mipmap);
    assert_eq!(k.min_filter, Filter::Nearest);
}

#[test]
fn equivalent_params_share_a_key() {
    let a = TextureParams {
        min_filter: Filter::LinearMipmapNearest,
        ..TextureParams::sized(300, 200)
    };
    let b = TextureParams {
        min_filter: Filter::Linear,
        ..TextureParams::sized(300, 200)
    };
    assert_ne!(a, b);
    assert_eq!(a.pool_key(), b.pool_key());
}

#[test]
fn overrides_keep_size_and_unset_fields() {
    let base = TextureParams::sized(64, 32);
    let o = ParamOverrides {
        texel_type: Some(TexelType::HalfFloat),
        mag_filter: Some(Filter::Nearest),
        ..ParamOverrides::default()
    };
    let p = o.apply(base);
    assert_eq!(p.width, 64);
    assert_eq!(p.height, 32);
    assert_eq!(p.texel_type, TexelType::HalfFloat);
    assert_eq!(p.mag_filter, Filter::Nearest);
    assert_eq!(p.format, base.format);
}

#[test]
fn overrides_deserialize_with_type_alias() {
    let o: ParamOverrides =
        serde_json::from_str(r#"{"type":"float","min_filter":"nearest"}"#).unwrap();
    assert_eq!(o.texel_type, Some(TexelType::Float));
    assert_eq!(o.min_filter, Some(Filter::Nearest));
    assert_eq!(o.format, None);
}
