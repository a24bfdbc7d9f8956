// Composition state unit tests

use brandmark::watermark::*;
use bytes::Bytes;
use image::RgbaImage;
use std::sync::Arc;

fn ready(width: u32, height: u32) -> Result<Arc<RgbaImage>, WatermarkError> {
    Ok(Arc::new(RgbaImage::new(width, height)))
}

#[test]
fn test_reset_restores_defaults_and_keeps_watermark() {
    // Test: Reset touches the transform only
    let mut state = CompositionState::new();
    state.set_text("Sample Co.", Some("brand.txt".to_string()));
    state.transform_mut().set_opacity(0.9);
    state.transform_mut().set_scale(0.7);
    state.transform_mut().set_anchor(Anchor::new(0.1, 0.9));

    state.reset_transform();

    let transform = state.transform();
    assert_eq!(transform.opacity(), 0.5);
    assert_eq!(transform.scale(), 0.3);
    assert_eq!(transform.anchor(), Anchor::new(0.5, 0.5));
    match state.watermark() {
        WatermarkDescriptor::Text { content } => assert_eq!(content, "Sample Co."),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_superseded_watermark_load_is_discarded() {
    // Test: a slow load for an earlier upload cannot overwrite a newer one
    let mut state = CompositionState::new();
    let first = state.begin_watermark_image(
        Locator::Blob(BlobHandle::new("a.png", Bytes::from_static(b"a"))),
        Some("a.png".to_string()),
    );
    let second = state.begin_watermark_image(
        Locator::Blob(BlobHandle::new("b.png", Bytes::from_static(b"b"))),
        Some("b.png".to_string()),
    );

    assert_eq!(state.complete_load(&second, ready(2, 2)), LoadOutcome::Ready);
    assert_eq!(state.complete_load(&first, ready(9, 9)), LoadOutcome::Stale);

    match state.watermark() {
        WatermarkDescriptor::Image { resource } => {
            assert_eq!(resource.natural_size(), Some((2, 2)));
        }
        other => panic!("expected image, got {:?}", other),
    }
}

#[test]
fn test_same_bytes_different_uploads_are_distinct() {
    // Test: re-uploading identical bytes still supersedes the previous load
    let mut state = CompositionState::new();
    let first = state.begin_watermark_image(
        Locator::Blob(BlobHandle::new("logo.png", Bytes::from_static(b"same"))),
        None,
    );
    let _second = state.begin_watermark_image(
        Locator::Blob(BlobHandle::new("logo.png", Bytes::from_static(b"same"))),
        None,
    );
    assert_eq!(state.complete_load(&first, ready(1, 1)), LoadOutcome::Stale);
}

#[test]
fn test_image_load_after_switch_to_text_is_stale() {
    let mut state = CompositionState::new();
    let ticket = state.begin_watermark_image(Locator::Path("logo.png".into()), None);
    state.set_text("Acme", None);

    assert_eq!(state.complete_load(&ticket, ready(4, 4)), LoadOutcome::Stale);
    assert!(matches!(state.watermark(), WatermarkDescriptor::Text { .. }));
}

#[test]
fn test_failed_load_leaves_resource_not_ready() {
    let mut state = CompositionState::new();
    let ticket = state.begin_product(Locator::Path("missing.png".into()));
    let outcome = state.complete_load(
        &ticket,
        Err(WatermarkError::FetchError("not found".to_string())),
    );

    assert_eq!(outcome, LoadOutcome::Failed);
    let product = state.product().unwrap();
    assert!(!product.is_ready());
    assert!(matches!(product.state(), LoadState::Failed(_)));
}
