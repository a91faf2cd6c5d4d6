use super::*;
use crate::node::decl::OutputDecl;
use crate::render::headless::{DrawTarget, HeadlessRenderer};
use crate::texture::params::TextureParams;

#[test]
fn pass_node_draws_under_its_name() {
    let mut r = HeadlessRenderer::new(16, 16);
    let tex = r.create_texture(&TextureParams::sized(16, 16)).unwrap();
    let mut inputs = PinTextures::new();
    inputs.insert(
        "texture".to_owned(),
        PooledTexture {
            id: tex,
            params: TextureParams::sized(16, 16),
        },
    );

    let mut node = PassNode::new(NodeDecl::new("blur").input("texture", "scene"));
    assert!(!node.uses_depth_buffer());
    assert!(node.validate_input("texture"));
    node.render(&mut r, &inputs, None, RenderTarget::Screen).unwrap();

    let draws = r.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].label, "blur");
    assert_eq!(draws[0].inputs, vec![("texture".to_owned(), tex)]);
    assert_eq!(draws[0].target, DrawTarget::Screen);
}

#[test]
fn fn_node_forwards_to_closure() {
    let mut r = HeadlessRenderer::new(16, 16);
    let mut calls = 0;
    {
        let mut node = FnNode::new(
            NodeDecl::new("source").output("out", OutputDecl::new()),
            |_r: &mut dyn Renderer, inputs: &PinTextures, outputs: Option<&PinTextures>, _t: RenderTarget<'_>| {
                assert!(inputs.is_empty());
                assert!(outputs.is_none());
                calls += 1;
                Ok(())
            },
        )
        .with_depth_buffer();
        assert!(node.uses_depth_buffer());
        assert_eq!(node.decl().name, "source");
        node.render(&mut r, &PinTextures::new(), None, RenderTarget::Screen)
            .unwrap();
        node.render(&mut r, &PinTextures::new(), None, RenderTarget::Screen)
            .unwrap();
    }
    assert_eq!(calls, 2);
    assert!(r.draws().is_empty());
}
