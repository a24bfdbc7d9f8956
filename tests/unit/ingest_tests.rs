// Watermark ingestion unit tests

use brandmark::watermark::*;
use rstest::rstest;

#[rstest]
#[case("logo.png", FileClass::Image)]
#[case("photo.JPEG", FileClass::Image)]
#[case("icon.svg", FileClass::Image)]
#[case("anim.gif", FileClass::Image)]
#[case("scan.bmp", FileClass::Image)]
#[case("shot.webp", FileClass::Image)]
#[case("brand.TXT", FileClass::Text)]
#[case("notes.txt", FileClass::Text)]
#[case("payload.exe", FileClass::Unrecognized)]
#[case("report.pdf", FileClass::Unrecognized)]
#[case("README", FileClass::Unrecognized)]
#[case("logo.png.exe", FileClass::Unrecognized)]
#[case("archive.tar.txt", FileClass::Text)]
fn test_classification_table(#[case] name: &str, #[case] expected: FileClass) {
    // Test: Classification depends only on the suffix after the last dot
    assert_eq!(IngestPolicy::restricted().classify(name), expected);
    assert_eq!(IngestPolicy::permissive().classify(name), expected);
}

#[rstest]
#[case(IngestMode::Restricted, "payload.exe", false)]
#[case(IngestMode::Permissive, "payload.exe", true)]
#[case(IngestMode::Restricted, "no_extension", false)]
#[case(IngestMode::Permissive, "no_extension", true)]
fn test_unrecognized_files_follow_mode(
    #[case] mode: IngestMode,
    #[case] name: &str,
    #[case] accepted: bool,
) {
    // Test: Unrecognized files are rejected or passed through per mode, never crash
    let policy = IngestPolicy {
        mode,
        ..IngestPolicy::restricted()
    };
    let mut state = CompositionState::new();
    let result = WatermarkIngestor::new(policy).ingest(WatermarkFile::new(name, vec![1, 2, 3]), &mut state);

    if accepted {
        assert_eq!(result.unwrap(), Ingested::Passthrough);
        assert!(state.watermark().is_passthrough());
    } else {
        assert!(matches!(result, Err(WatermarkError::RejectedFile(_))));
        assert!(matches!(state.watermark(), WatermarkDescriptor::None));
    }
}

#[test]
fn test_content_is_never_inspected() {
    // Test: PNG bytes named .txt are treated as text
    let png_magic = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    let mut state = CompositionState::new();
    let outcome = WatermarkIngestor::default()
        .ingest(WatermarkFile::new("sneaky.txt", png_magic), &mut state)
        .unwrap();
    assert_eq!(outcome, Ingested::Text);
}

#[test]
fn test_custom_extension_lists() {
    // Test: Extension sets come from the policy
    let policy = IngestPolicy {
        text_extensions: vec!["md".to_string()],
        image_extensions: vec!["png".to_string()],
        ..IngestPolicy::restricted()
    };
    assert!(policy.validate().is_ok());
    assert_eq!(policy.classify("README.md"), FileClass::Text);
    assert_eq!(policy.classify("notes.txt"), FileClass::Unrecognized);
    assert_eq!(policy.classify("logo.jpg"), FileClass::Unrecognized);
}

#[test]
fn test_policy_deserializes_from_yaml() {
    let yaml = r#"
mode: permissive
sanitize_filenames: true
max_file_bytes: 1048576
"#;
    let policy: IngestPolicy = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(policy.mode, IngestMode::Permissive);
    assert!(policy.sanitize_filenames);
    assert_eq!(policy.max_file_bytes, Some(1_048_576));
    assert_eq!(policy.image_extensions.len(), 7);
}

#[test]
fn test_filenames_kept_verbatim_by_default() {
    // Test: No sanitization unless the policy asks for it
    let mut state = CompositionState::new();
    WatermarkIngestor::new(IngestPolicy::permissive())
        .ingest(WatermarkFile::new("../../etc/passwd", "root"), &mut state)
        .unwrap();
    assert_eq!(state.watermark_name(), Some("../../etc/passwd"));
}

#[test]
fn test_sanitizing_policy_rejects_traversal() {
    let policy = IngestPolicy {
        sanitize_filenames: true,
        ..IngestPolicy::permissive()
    };
    let mut state = CompositionState::new();
    let result = WatermarkIngestor::new(policy)
        .ingest(WatermarkFile::new("../../etc/passwd", "root"), &mut state);
    assert!(matches!(result, Err(WatermarkError::RejectedFile(_))));
}
