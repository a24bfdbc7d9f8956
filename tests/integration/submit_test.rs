// Upload integration tests against a mock scan service

use super::common::*;
use brandmark::session::PreviewStatus;
use brandmark::submit::SubmissionStatus;
use brandmark::watermark::*;
use mockito::Matcher;

#[tokio::test]
async fn test_protected_submit_posts_to_scan_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sdk/upload")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="brand.png""#.to_string()),
            Matcher::Regex(r#"name="scanProtection"\r\n\r\ntrue"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"verdict":"clean","findings":[]}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session =
        loaded_session(dir.path(), IngestPolicy::restricted(), Some(server.url())).await;
    session
        .ingest(WatermarkFile::new("brand.txt", "Acme"))
        .await
        .unwrap();

    let result = session.submit(true).await.unwrap();
    assert_eq!(result.value()["verdict"], "clean");
    assert!(matches!(
        session.submission_status(),
        SubmissionStatus::Succeeded(_)
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unprotected_submit_uses_raw_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sdk/upload/unprotected")
        .match_body(Matcher::Regex(
            r#"name="scanProtection"\r\n\r\nfalse"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"stored":true}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session =
        loaded_session(dir.path(), IngestPolicy::restricted(), Some(server.url())).await;

    let result = session.submit(false).await.unwrap();
    assert_eq!(result.value()["stored"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_passthrough_submit_sends_original_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sdk/upload")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="report.pdf""#.to_string()),
            Matcher::Regex("%PDF-1.4 payload".to_string()),
        ]))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session =
        loaded_session(dir.path(), IngestPolicy::permissive(), Some(server.url())).await;
    session
        .ingest(WatermarkFile::new("report.pdf", "%PDF-1.4 payload"))
        .await
        .unwrap();
    assert_eq!(session.preview_status(), PreviewStatus::Passthrough);

    session.submit(true).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_failed_upload_keeps_composition() {
    // Test: a non-2xx response is reported and nothing else changes
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sdk/upload")
        .with_status(503)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session =
        loaded_session(dir.path(), IngestPolicy::restricted(), Some(server.url())).await;
    session
        .ingest(WatermarkFile::new("brand.txt", "Acme"))
        .await
        .unwrap();
    session.set_anchor(0.25, 0.75);
    let before = session.surface().image().clone();
    let transform = *session.state().transform();

    let err = session.submit(true).await.unwrap_err();
    assert!(err.to_string().contains("Upload failed"));
    assert!(matches!(
        session.submission_status(),
        SubmissionStatus::Failed(_)
    ));
    assert_eq!(session.state().transform(), &transform);
    assert_eq!(session.surface().image(), &before);
    mock.assert_async().await;

    // Retry is allowed after a failure
    assert!(session.submit(true).await.is_err());
}

#[tokio::test]
async fn test_sequential_submits_each_reach_the_server() {
    // Test: a finished submission never blocks the next one
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sdk/upload")
        .with_status(200)
        .with_body(r#"{"verdict":"clean"}"#)
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session =
        loaded_session(dir.path(), IngestPolicy::restricted(), Some(server.url())).await;

    session.submit(true).await.unwrap();
    session.submit(true).await.unwrap();
    assert!(matches!(
        session.submission_status(),
        SubmissionStatus::Succeeded(_)
    ));
    mock.assert_async().await;
}
