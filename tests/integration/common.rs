// Shared fixtures for integration tests

use brandmark::config::{Config, ProductEntry};
use brandmark::session::EditorSession;
use brandmark::watermark::{IngestPolicy, LoadOutcome};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

pub const PRODUCT_COLOR: Rgba<u8> = Rgba([0, 128, 0, 255]);

/// Write a solid-color PNG and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: Rgba<u8>) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, color)
        .save(&path)
        .expect("Failed to write test PNG");
    path
}

/// PNG bytes of a solid-color image.
pub fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, color)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("Failed to encode test PNG");
    out.into_inner()
}

/// Assert two pixels match within resampling error.
pub fn assert_close(actual: &Rgba<u8>, expected: Rgba<u8>) {
    for c in 0..4 {
        assert!(
            (actual[c] as i16 - expected[c] as i16).abs() <= 2,
            "{:?} != {:?}",
            actual,
            expected
        );
    }
}

/// Config with a two-entry catalog of solid-color mockups in `dir`.
pub fn config_for(dir: &Path, policy: IngestPolicy, base_url: Option<String>) -> Config {
    let stack = write_png(dir, "stack.png", 400, 260, PRODUCT_COLOR);
    let hero = write_png(dir, "hero.png", 30, 30, Rgba([200, 200, 200, 255]));

    let mut config = Config::default();
    config.canvas.width = 400;
    config.canvas.height = 260;
    config.products = vec![
        ProductEntry::new("Paper Stack", stack.to_string_lossy()),
        ProductEntry::new("Paper Hero", hero.to_string_lossy()),
    ];
    config.ingest = policy;
    if let Some(base_url) = base_url {
        config.submit.base_url = base_url;
    }
    config
}

/// Session with the first catalog product loaded.
pub async fn loaded_session(
    dir: &Path,
    policy: IngestPolicy,
    base_url: Option<String>,
) -> EditorSession {
    let mut session = EditorSession::new(config_for(dir, policy, base_url)).unwrap();
    let ticket = session.select_product("Paper Stack").unwrap();
    assert_eq!(session.load(ticket).await, LoadOutcome::Ready);
    session
}
