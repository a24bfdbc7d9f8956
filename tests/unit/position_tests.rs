// Watermark placement unit tests

use brandmark::watermark::*;

fn dims(width: u32, height: u32) -> ImageDimensions {
    ImageDimensions { width, height }
}

#[test]
fn test_target_width_for_every_scale_and_width() {
    // Test: target width is clamp(scale * W, 16, W) across the slider range
    for canvas_width in [16u32, 50, 160, 640, 1000, 1920] {
        for step in 10..=90 {
            let scale = step as f32 / 100.0;
            let expected = (scale * canvas_width as f32).clamp(16.0, canvas_width as f32);
            let actual = target_width(scale, canvas_width);
            assert!(
                (actual - expected).abs() < 1e-3,
                "scale {} width {}: {} != {}",
                scale,
                canvas_width,
                actual,
                expected
            );
        }
    }
}

#[test]
fn test_target_height_preserves_watermark_aspect() {
    // Test: height follows the watermark's intrinsic ratio, not the canvas
    let natural = dims(400, 100);
    for canvas in [dims(1000, 650), dims(1000, 100), dims(1000, 3000)] {
        let size = target_size(0.5, &canvas, &natural).unwrap();
        assert_eq!(size.width, 500);
        assert_eq!(size.height, 125);
    }
}

#[test]
fn test_scale_setter_clamps_to_slider_range() {
    let mut transform = Transform::default();
    transform.set_scale(5.0);
    assert_eq!(transform.scale(), 0.9);
    transform.set_scale(0.0);
    assert_eq!(transform.scale(), 0.1);
}

#[test]
fn test_overlay_centered_on_anchor() {
    let canvas = dims(1000, 650);
    let size = WatermarkDimensions {
        width: 200,
        height: 100,
    };
    let pos = centered_at(Anchor::new(0.25, 0.75), &canvas, &size);
    assert_eq!(pos, PlacementPosition::new(150, 438));
    assert_eq!(
        visible_region(&pos, &canvas, &size),
        Some(ClipRect {
            x0: 150,
            y0: 438,
            x1: 350,
            y1: 538
        })
    );
}
