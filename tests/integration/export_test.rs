// Download/export integration tests

use super::common::*;
use brandmark::session::EditorSession;
use brandmark::watermark::*;
use image::Rgba;

#[tokio::test]
async fn test_download_writes_png_named_after_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut session = loaded_session(dir.path(), IngestPolicy::restricted(), None).await;
    session
        .ingest(WatermarkFile::new("brand.txt", "Acme"))
        .await
        .unwrap();

    let path = session.download(out.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "brand.png");

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (400, 260));
    assert_eq!(decoded.get_pixel(0, 0), &PRODUCT_COLOR);
    assert_eq!(&decoded, session.surface().image());
}

#[tokio::test]
async fn test_blank_session_exports_blank_png() {
    // Test: nothing loaded still exports a transparent canvas under the default name
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let session =
        EditorSession::new(config_for(dir.path(), IngestPolicy::restricted(), None)).unwrap();

    let path = session.download(out.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "boring-paper-watermarked.png");

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (400, 260));
    assert!(decoded.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
}

#[tokio::test]
async fn test_passthrough_download_keeps_original_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut session = loaded_session(dir.path(), IngestPolicy::permissive(), None).await;
    let raw = b"%PDF-1.4 not really a pdf".to_vec();

    let outcome = session
        .ingest(WatermarkFile::new("report.pdf", raw.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, Ingested::Passthrough);

    let path = session.download(out.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "report.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), raw);
    assert!(!session.artifact().unwrap().is_png());
}
