use super::*;

fn vp(w: u32, h: u32) -> Viewport {
    Viewport {
        width: w,
        height: h,
        dpr: 2.0,
    }
}

fn no_inputs(_: &str) -> Option<TextureParams> {
    None
}

#[test]
fn absolute_and_viewport_sizes() {
    let v = vp(100, 40);
    assert_eq!(
        SizeSpec::Absolute(0).resolve(Axis::Width, v, &mut no_inputs),
        Some(1)
    );
    assert_eq!(
        SizeSpec::viewport(0.5).resolve(Axis::Width, v, &mut no_inputs),
        Some(50)
    );
    assert_eq!(
        SizeSpec::viewport(0.5).resolve(Axis::Height, v, &mut no_inputs),
        Some(20)
    );
    assert_eq!(
        SizeSpec::viewport(0.001).resolve(Axis::Height, v, &mut no_inputs),
        Some(1)
    );
}

#[test]
fn input_relative_size_needs_bound_input() {
    let v = vp(100, 100);
    let mut lookup = |pin: &str| (pin == "texture").then(|| TextureParams::sized(64, 32));
    assert_eq!(
        SizeSpec::input("texture", 0.25).resolve(Axis::Width, v, &mut lookup),
        Some(16)
    );
    assert_eq!(
        SizeSpec::input("texture", 0.25).resolve(Axis::Height, v, &mut lookup),
        Some(8)
    );
    assert_eq!(
        SizeSpec::input("other", 1.0).resolve(Axis::Width, v, &mut lookup),
        None
    );
}

#[test]
fn expression_sees_scaled_viewport_and_dpr() {
    let v = vp(200, 100);
    let size = SizeSpec::Expr {
        expr: SizeExpr::parse("expr(width / 2 + dpr)").unwrap(),
        scale: 0.5,
    };
    assert_eq!(size.resolve(Axis::Width, v, &mut no_inputs), Some(52));
}

#[test]
fn failing_expression_inherits() {
    let size = SizeExpr::parse("width / 0").map(|expr| SizeSpec::Expr { expr, scale: 1.0 });
    let size = size.unwrap();
    assert_eq!(size.resolve(Axis::Width, vp(10, 10), &mut no_inputs), None);
}

#[test]
fn host_function_is_clamped() {
    let size = SizeSpec::func(|v| v.width / 1000);
    assert_eq!(size.resolve(Axis::Width, vp(10, 10), &mut no_inputs), Some(1));
    assert_eq!(format!("{size:?}"), "Func(..)");
}

#[test]
fn decl_builder_and_first_output() {
    let decl = NodeDecl::new("blur")
        .input("texture", "scene")
        .input("depth", InputLink::pin("scene", "depth"))
        .output("out", OutputDecl::new().input_scale("texture", 0.5))
        .output("aux", OutputDecl::new().attachment(1).disabled());

    assert_eq!(decl.name, "blur");
    assert_eq!(decl.inputs["texture"], InputLink::node("scene"));
    assert_eq!(decl.inputs["depth"].output.as_deref(), Some("depth"));
    assert_eq!(decl.first_output(), Some("out"));
    assert!(decl.outputs["aux"].disabled);
    assert!(!decl.render_to_screen);
    assert!(NodeDecl::new("x").first_output().is_none());
}
