// Configuration module unit tests

use brandmark::config::*;
use brandmark::logging::LogFormat;
use brandmark::watermark::IngestMode;

#[test]
fn test_can_deserialize_complete_yaml_config() {
    let yaml = r##"
canvas:
  width: 1200
  height: 800
products:
  - label: "Tote Bag"
    source: "mockups/tote.png"
  - label: "Mug"
    source: "https://cdn.example.com/mug.jpg"
text:
  fill_color: "#FAFAFA"
  stroke_color: "#222"
  stroke_width: 3
ingest:
  mode: permissive
  text_extensions: [txt, md]
  image_extensions: [png, svg]
  sanitize_filenames: true
  max_file_bytes: 5000000
export:
  default_basename: merch-preview
submit:
  base_url: "https://uploads.example.com"
  protected_path: "/scan/upload"
  unprotected_path: "/raw/upload"
  timeout_seconds: 10
loader:
  max_cache_entries: 4
  cache_ttl_seconds: 60
  timeout_seconds: 5
logging:
  level: warn
  format: json
"##;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    assert_eq!(config.canvas.width, 1200);
    assert_eq!(config.products.len(), 2);
    assert_eq!(config.products[1].label, "Mug");
    assert_eq!(config.text.stroke_width, 3.0);
    assert_eq!(config.ingest.mode, IngestMode::Permissive);
    assert_eq!(config.ingest.text_extensions, vec!["txt", "md"]);
    assert_eq!(config.export.default_basename, "merch-preview");
    assert_eq!(
        config.submit.endpoint(false),
        "https://uploads.example.com/raw/upload"
    );
    assert_eq!(config.loader.max_cache_entries, 4);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_validation_rejects_overlapping_extensions() {
    let yaml = r#"
ingest:
  text_extensions: [txt]
  image_extensions: [png, txt]
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_validation_rejects_empty_label() {
    let yaml = r#"
products:
  - label: ""
    source: "x.png"
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_unknown_log_level() {
    let yaml = r#"
logging:
  level: chatty
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_mode_is_parse_error() {
    let yaml = r#"
ingest:
  mode: anything-goes
"#;
    assert!(matches!(
        Config::from_yaml_with_env(yaml),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_oversized_canvas_is_rejected_before_allocation() {
    // Test: a 100000x100000 canvas fails validation, so no session surface is built
    let yaml = r#"
canvas:
  width: 100000
  height: 100000
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    assert!(brandmark::session::EditorSession::new(config).is_err());
}
