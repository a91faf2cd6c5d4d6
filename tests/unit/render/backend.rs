use super::*;

fn tex(id: u64) -> PooledTexture {
    PooledTexture {
        id: TextureId(id),
        params: TextureParams::sized(4, 4),
    }
}

#[test]
fn attach_replaces_same_slot_and_orders_slots() {
    let mut fb = FrameBuffer::new(false);
    fb.attach(tex(1), 2);
    fb.attach(tex(2), 0);
    fb.attach(tex(3), 2);

    let slots: Vec<(u32, u64)> = fb.attachments().iter().map(|(a, t)| (*a, t.id.0)).collect();
    assert_eq!(slots, vec![(0, 2), (2, 3)]);
    assert_eq!(fb.attachment(2).map(|t| t.id), Some(TextureId(3)));
    assert_eq!(fb.attachment(1), None);
}

#[test]
fn clear_textures_detaches_everything() {
    let mut fb = FrameBuffer::new(true);
    fb.attach(tex(1), 0);
    fb.clear_textures();
    assert!(fb.attachments().is_empty());
    assert!(fb.has_depth_buffer());
}
