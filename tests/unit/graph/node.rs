use super::*;
use crate::node::composite::PassNode;
use crate::node::decl::{NodeDecl, OutputDecl, SizeSpec};
use crate::render::headless::HeadlessRenderer;
use crate::texture::params::{ParamOverrides, TexelType};

fn vp(w: u32, h: u32) -> Viewport {
    Viewport {
        width: w,
        height: h,
        dpr: 1.0,
    }
}

fn arena(decls: Vec<NodeDecl>) -> NodeArena {
    let mut arena = NodeArena::default();
    for (i, decl) in decls.into_iter().enumerate() {
        arena.nodes.insert(
            NodeId(i as u32),
            RenderGraphNode::new(Box::new(PassNode::new(decl))),
        );
    }
    arena
}

fn wire(arena: &mut NodeArena, from: (u32, &str), to: (u32, &str)) {
    arena.get_mut(NodeId(from.0)).unwrap().link_to(
        from.1.to_owned(),
        Link {
            node: NodeId(to.0),
            pin: to.1.to_owned(),
        },
    );
    arena.get_mut(NodeId(to.0)).unwrap().link_from(
        to.1.to_owned(),
        Link {
            node: NodeId(from.0),
            pin: from.1.to_owned(),
        },
    );
}

#[test]
fn params_inherit_largest_input_and_apply_overrides() {
    let mut a = arena(vec![
        NodeDecl::new("small").output("out", OutputDecl::new().size(64u32, 64u32)),
        NodeDecl::new("large").output(
            "out",
            OutputDecl::new().size(256u32, 128u32).params(ParamOverrides {
                texel_type: Some(TexelType::HalfFloat),
                ..ParamOverrides::default()
            }),
        ),
        NodeDecl::new("mix")
            .input("a", "small")
            .input("b", "large")
            .output("out", OutputDecl::new()),
    ]);
    wire(&mut a, (0, "out"), (2, "a"));
    wire(&mut a, (1, "out"), (2, "b"));

    let p = a.texture_params(NodeId(2), "out", vp(10, 10)).unwrap();
    assert_eq!((p.width, p.height), (256, 128));
    assert_eq!(p.texel_type, TexelType::HalfFloat);
}

#[test]
fn equal_area_inputs_keep_first_pin() {
    let mut a = arena(vec![
        NodeDecl::new("wide").output("out", OutputDecl::new().size(200u32, 50u32)),
        NodeDecl::new("tall").output("out", OutputDecl::new().size(50u32, 200u32)),
        NodeDecl::new("mix")
            .input("a", "wide")
            .input("b", "tall")
            .output("out", OutputDecl::new()),
    ]);
    wire(&mut a, (0, "out"), (2, "a"));
    wire(&mut a, (1, "out"), (2, "b"));

    let p = a.texture_params(NodeId(2), "out", vp(10, 10)).unwrap();
    assert_eq!((p.width, p.height), (200, 50));
}

#[test]
fn params_without_inputs_use_viewport_and_are_memoized() {
    let mut a = arena(vec![
        NodeDecl::new("src").output("out", OutputDecl::new()),
        NodeDecl::new("half").output("out", OutputDecl::new().viewport_scale(0.5)),
    ]);
    let p = a.texture_params(NodeId(0), "out", vp(80, 60)).unwrap();
    assert_eq!((p.width, p.height), (80, 60));
    let p = a.texture_params(NodeId(1), "out", vp(80, 60)).unwrap();
    assert_eq!((p.width, p.height), (40, 30));

    // Cached until invalidated.
    let p = a.texture_params(NodeId(1), "out", vp(10, 10)).unwrap();
    assert_eq!((p.width, p.height), (40, 30));
    a.get_mut(NodeId(1)).unwrap().invalidate_params();
    let p = a.texture_params(NodeId(1), "out", vp(10, 10)).unwrap();
    assert_eq!((p.width, p.height), (5, 5));

    assert!(a.texture_params(NodeId(0), "missing", vp(10, 10)).is_none());
}

#[test]
fn one_axis_explicit_other_inherited() {
    let mut a = arena(vec![
        NodeDecl::new("src").output("out", OutputDecl::new().size(300u32, 100u32)),
        NodeDecl::new("strip").input("t", "src").output(
            "out",
            OutputDecl {
                width: Some(SizeSpec::Absolute(16)),
                ..OutputDecl::default()
            },
        ),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    let p = a.texture_params(NodeId(1), "out", vp(10, 10)).unwrap();
    assert_eq!((p.width, p.height), (16, 100));
}

#[test]
fn cyclic_params_lookup_terminates() {
    let mut a = arena(vec![
        NodeDecl::new("a").input("t", "b").output("out", OutputDecl::new()),
        NodeDecl::new("b").input("t", "a").output("out", OutputDecl::new()),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    wire(&mut a, (1, "out"), (0, "t"));
    let p = a.texture_params(NodeId(0), "out", vp(32, 16)).unwrap();
    assert_eq!((p.width, p.height), (32, 16));
}

#[test]
fn diamond_counts_each_edge_once() {
    let mut a = arena(vec![
        NodeDecl::new("scene").output("out", OutputDecl::new()),
        NodeDecl::new("source").input("t", "scene").output("out", OutputDecl::new()),
        NodeDecl::new("fa").input("t", "source").output("out", OutputDecl::new()),
        NodeDecl::new("fb").input("t", "source").output("out", OutputDecl::new()),
        NodeDecl::new("comp").input("a", "fa").input("b", "fb"),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    wire(&mut a, (1, "out"), (2, "t"));
    wire(&mut a, (1, "out"), (3, "t"));
    wire(&mut a, (2, "out"), (4, "a"));
    wire(&mut a, (3, "out"), (4, "b"));

    for node in a.nodes.values_mut() {
        node.before_render();
    }
    a.count_reference(NodeId(4), None);

    let refs = |a: &NodeArena, id: u32| a.get(NodeId(id)).unwrap().output_references["out"];
    assert_eq!(refs(&a, 0), 1);
    assert_eq!(refs(&a, 1), 2);
    assert_eq!(refs(&a, 2), 1);
    assert_eq!(refs(&a, 3), 1);
}

#[test]
fn release_below_zero_is_reported() {
    let mut a = arena(vec![
        NodeDecl::new("src").output("out", OutputDecl::new()),
        NodeDecl::new("sink").input("t", "src"),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    for node in a.nodes.values_mut() {
        node.before_render();
    }

    let mut renderer = HeadlessRenderer::new(8, 8);
    let mut pool = TexturePool::default();
    let mut shared = FrameBuffer::new(false);
    let mut shared_depth = FrameBuffer::new(true);
    let mut events = EventChannel::new();
    let mut ctx = FrameCtx {
        renderer: &mut renderer,
        pool: &mut pool,
        shared: &mut shared,
        shared_depth: &mut shared_depth,
        final_target: None,
        viewport: vp(8, 8),
        events: &mut events,
        rendered: Vec::new(),
        diagnostics: Vec::new(),
    };
    a.release_reference(NodeId(0), "out", &mut ctx);
    assert_eq!(
        ctx.diagnostics,
        vec![Diagnostic::ReferenceUnderflow {
            node: "src".to_owned(),
            pin: "out".to_owned(),
        }]
    );
}

#[test]
fn rendered_chain_returns_everything_to_pool() {
    let mut a = arena(vec![
        NodeDecl::new("src").output("out", OutputDecl::new()),
        NodeDecl::new("sink").input("t", "src"),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    for node in a.nodes.values_mut() {
        node.before_render();
    }
    a.count_reference(NodeId(1), None);

    let mut renderer = HeadlessRenderer::new(8, 8);
    let mut pool = TexturePool::default();
    let mut shared = FrameBuffer::new(false);
    let mut shared_depth = FrameBuffer::new(true);
    let mut events = EventChannel::new();
    let mut ctx = FrameCtx {
        renderer: &mut renderer,
        pool: &mut pool,
        shared: &mut shared,
        shared_depth: &mut shared_depth,
        final_target: None,
        viewport: vp(8, 8),
        events: &mut events,
        rendered: Vec::new(),
        diagnostics: Vec::new(),
    };
    a.render(NodeId(1), &mut ctx).unwrap();
    assert_eq!(ctx.rendered, vec![NodeId(0), NodeId(1)]);
    assert!(ctx.diagnostics.is_empty());
    assert_eq!(a.get(NodeId(0)).unwrap().state, RenderState::Rendered);

    let st = pool.stats();
    assert_eq!(st.allocations, 1);
    assert_eq!(st.releases, 1);
    assert_eq!(st.on_loan, 0);
}

#[test]
fn collapsed_viewport_still_yields_a_texel() {
    let mut a = arena(vec![NodeDecl::new("src").output("out", OutputDecl::new())]);
    let p = a.texture_params(NodeId(0), "out", vp(0, 0)).unwrap();
    assert_eq!((p.width, p.height), (1, 1));
}

#[test]
fn render_resolves_params_for_unlinked_outputs_too() {
    let mut a = arena(vec![
        NodeDecl::new("src")
            .output("out", OutputDecl::new())
            .output("spare", OutputDecl::new().viewport_scale(0.5)),
        NodeDecl::new("sink").input("t", "src"),
    ]);
    wire(&mut a, (0, "out"), (1, "t"));
    for node in a.nodes.values_mut() {
        node.before_render();
    }
    a.count_reference(NodeId(1), None);

    let mut renderer = HeadlessRenderer::new(8, 8);
    let mut pool = TexturePool::default();
    let mut shared = FrameBuffer::new(false);
    let mut shared_depth = FrameBuffer::new(true);
    let mut events = EventChannel::new();
    let mut ctx = FrameCtx {
        renderer: &mut renderer,
        pool: &mut pool,
        shared: &mut shared,
        shared_depth: &mut shared_depth,
        final_target: None,
        viewport: vp(8, 8),
        events: &mut events,
        rendered: Vec::new(),
        diagnostics: Vec::new(),
    };
    a.render(NodeId(1), &mut ctx).unwrap();

    let src = a.get(NodeId(0)).unwrap();
    let spare = src.texture_params.get("spare").copied().unwrap();
    assert_eq!((spare.width, spare.height), (4, 4));
    // Only the linked output is backed by a texture.
    assert_eq!(pool.stats().allocations, 1);
}
