mod helpers;

use helpers::{client_for, envelope, failure, form_field, signed_in_client, small_policy};
use minsul_api_client::{ClientError, UploadOptions, UploadSource};
use minsul_core::constants::MIB;
use minsul_core::{UploadCategory, UploadPolicy};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CHUNK_PATH: &str = "/api/upload/posts/chunk";

/// Mock for one chunk index that answers with `url` (empty while incomplete).
async fn chunk_mock(server: &mut ServerGuard, index: u32, total: u32, url: &str) -> Mock {
    server
        .mock("POST", CHUNK_PATH)
        .match_body(Matcher::AllOf(vec![
            form_field("chunkIndex", &index.to_string()),
            form_field("totalChunks", &total.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(json!({ "url": url })))
        .expect(1)
        .create_async()
        .await
}

async fn unused_chunk_mock(server: &mut ServerGuard, index: u32) -> Mock {
    server
        .mock("POST", CHUNK_PATH)
        .match_body(form_field("chunkIndex", &index.to_string()))
        .expect(0)
        .create_async()
        .await
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

#[tokio::test]
async fn large_file_is_sent_in_chunks_until_server_reports_url() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for index in 0..3 {
        mocks.push(chunk_mock(&mut server, index, 4, "").await);
    }
    mocks.push(chunk_mock(&mut server, 3, 4, "/uploads/posts/big.bin").await);

    let client = signed_in_client(&server.url());
    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = progress.clone();
    let options = UploadOptions::new().on_progress(move |p| seen.lock().unwrap().push(p));

    let source = UploadSource::from_bytes("big.bin", payload(2 * MIB as usize));
    let result = client
        .upload(&source, UploadCategory::Posts, &options)
        .await
        .unwrap();

    assert_eq!(result.url, "/uploads/posts/big.bin");
    assert_eq!(result.size, 2 * MIB);
    assert_eq!(result.mime_type, "application/octet-stream");
    for mock in mocks {
        mock.assert_async().await;
    }

    let progress = progress.lock().unwrap();
    assert_eq!(progress.len(), 4);
    assert_eq!(progress[0].bytes_sent, 512 * 1024);
    assert_eq!(progress[3].chunks_sent, 4);
    assert_eq!(progress[3].percent(), 100.0);
}

#[tokio::test]
async fn chunk_requests_carry_session_fields() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("POST", CHUNK_PATH)
        .match_body(Matcher::AllOf(vec![
            form_field("chunkIndex", "0"),
            form_field("totalChunks", "3"),
            form_field("originalSize", "20"),
            form_field("originalName", "photo.png"),
            Matcher::Regex(r#"name="tempFileId"\r\n\r\n\d+_[0-9a-f]{12}\r\n"#.to_string()),
            Matcher::Regex(r#"name="file"; filename="photo.png""#.to_string()),
        ]))
        .with_status(200)
        .with_body(envelope(json!({
            "url": "/uploads/posts/photo.png",
            "mime_type": "image/png",
            "thumbnail_url": "/uploads/posts/thumb_photo.png"
        })))
        .expect(1)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let result = client
        .upload_bytes("photo.png", payload(20), UploadCategory::Posts)
        .await
        .unwrap();

    assert_eq!(result.mime_type, "image/png");
    assert_eq!(
        result.thumbnail_url.as_deref(),
        Some("/uploads/posts/thumb_photo.png")
    );
    first.assert_async().await;
}

#[tokio::test]
async fn each_chunk_carries_its_own_slice() {
    let mut server = Server::new_async().await;
    let middle = server
        .mock("POST", CHUNK_PATH)
        .match_body(Matcher::AllOf(vec![
            form_field("chunkIndex", "1"),
            Matcher::Regex(
                "filename=\"slice.bin\"\r\nContent-Type: application/octet-stream\r\n\r\nijklmnop\r\n--"
                    .to_string(),
            ),
        ]))
        .with_status(200)
        .with_body(envelope(json!({ "url": "/uploads/posts/slice.bin" })))
        .expect(1)
        .create_async()
        .await;
    let first = chunk_mock(&mut server, 0, 3, "").await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let result = client
        .upload_bytes("slice.bin", payload(20), UploadCategory::Posts)
        .await
        .unwrap();

    assert_eq!(result.url, "/uploads/posts/slice.bin");
    first.assert_async().await;
    middle.assert_async().await;
}

#[tokio::test]
async fn early_url_stops_the_loop() {
    let mut server = Server::new_async().await;
    let first = chunk_mock(&mut server, 0, 5, "").await;
    let second = chunk_mock(&mut server, 1, 5, "/uploads/posts/early.bin").await;
    let rest = [
        unused_chunk_mock(&mut server, 2).await,
        unused_chunk_mock(&mut server, 3).await,
        unused_chunk_mock(&mut server, 4).await,
    ];

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let result = client
        .upload_bytes("early.bin", payload(40), UploadCategory::Posts)
        .await
        .unwrap();

    assert_eq!(result.url, "/uploads/posts/early.bin");
    first.assert_async().await;
    second.assert_async().await;
    for mock in rest {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn rejected_chunk_stops_with_its_index() {
    let mut server = Server::new_async().await;
    let first = chunk_mock(&mut server, 0, 5, "").await;
    let second = server
        .mock("POST", CHUNK_PATH)
        .match_body(form_field("chunkIndex", "1"))
        .with_status(500)
        .with_body("disk full")
        .expect(1)
        .create_async()
        .await;
    let third = unused_chunk_mock(&mut server, 2).await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("broken.bin", payload(40), UploadCategory::Posts)
        .await
        .unwrap_err();

    match err {
        ClientError::ChunkUploadFailed {
            index,
            status,
            body,
        } => {
            assert_eq!(index, 1);
            assert_eq!(status, 500);
            assert_eq!(body, "disk full");
        }
        other => panic!("expected chunk failure, got {:?}", other),
    }
    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn unsuccessful_envelope_counts_as_rejected_chunk() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", CHUNK_PATH)
        .with_status(200)
        .with_body(failure("Invalid chunk"))
        .expect(1)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("a.bin", payload(20), UploadCategory::Posts)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::ChunkUploadFailed { index: 0, status: 200, ref body } if body == "Invalid chunk"
    ));
}

#[tokio::test]
async fn missing_url_after_last_chunk_is_incomplete() {
    let mut server = Server::new_async().await;
    let chunks = server
        .mock("POST", CHUNK_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "url": "" })))
        .expect(5)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("lost.bin", payload(40), UploadCategory::Posts)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::UploadIncomplete { total_chunks: 5 }));
    chunks.assert_async().await;
}

#[tokio::test]
async fn oversized_file_is_rejected_before_any_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("huge.bin", payload(1025), UploadCategory::Posts)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::FileTooLarge {
            size: 1025,
            max: 1024
        }
    ));
    any.assert_async().await;
}

#[tokio::test]
async fn zero_deadline_policy_is_rejected_before_any_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let policy = UploadPolicy {
        simple_upload_timeout: Duration::ZERO,
        ..small_policy()
    };
    let client = signed_in_client(&server.url()).with_upload_policy(policy);
    let err = client
        .upload_bytes("a.txt", payload(4), UploadCategory::Posts)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "INVALID_POLICY");
    any.assert_async().await;
}

#[tokio::test]
async fn default_limit_rejects_files_over_fifty_mib() {
    let server = Server::new_async().await;
    let client = signed_in_client(&server.url());
    let source = UploadSource::from_bytes("huge.bin", vec![0u8; (50 * MIB + 1) as usize]);

    let err = client
        .upload(&source, UploadCategory::Site, &UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_TOO_LARGE");
}

#[tokio::test]
async fn upload_requires_a_credential() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("a.txt", payload(4), UploadCategory::Posts)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NoCredential));
    any.assert_async().await;
}

#[tokio::test]
async fn small_file_uses_single_request() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/api/upload/profiles")
        .match_body(Matcher::Regex(
            r#"name="file"; filename="note.txt""#.to_string(),
        ))
        .with_status(200)
        .with_body(envelope(json!({
            "url": "/uploads/profiles/note.txt",
            "file": { "id": "f-1" }
        })))
        .expect(1)
        .create_async()
        .await;
    let chunk = server
        .mock("POST", "/api/upload/profiles/chunk")
        .expect(0)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let result = client
        .upload_bytes("note.txt", payload(16), UploadCategory::Profiles)
        .await
        .unwrap();

    assert_eq!(result.url, "/uploads/profiles/note.txt");
    assert_eq!(result.size, 16);
    assert_eq!(result.mime_type, "text/plain");
    assert_eq!(result.file_record, Some(json!({ "id": "f-1" })));
    upload.assert_async().await;
    chunk.assert_async().await;
}

#[tokio::test]
async fn small_file_rejection_reports_status_and_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/upload/site")
        .with_status(413)
        .with_body("Payload Too Large")
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let err = client
        .upload_bytes("logo.svg", payload(8), UploadCategory::Site)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::UploadFailed { status: 413, ref body } if body == "Payload Too Large"
    ));
}

#[tokio::test]
async fn stalled_small_upload_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let deadline = Duration::from_millis(200);
    let policy = UploadPolicy {
        simple_upload_timeout: deadline,
        ..small_policy()
    };
    let client = signed_in_client(&format!("http://{}", addr)).with_upload_policy(policy);

    let err = client
        .upload_bytes("slow.txt", payload(8), UploadCategory::Posts)
        .await
        .unwrap_err();

    match err {
        ClientError::UploadTimeout(after) => assert_eq!(after, deadline),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn cancellation_stops_between_chunks() {
    let mut server = Server::new_async().await;
    let first = chunk_mock(&mut server, 0, 5, "").await;
    let second = unused_chunk_mock(&mut server, 1).await;

    let policy = UploadPolicy {
        inter_chunk_delay: Duration::from_secs(30),
        ..small_policy()
    };
    let client = signed_in_client(&server.url()).with_upload_policy(policy);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let options = UploadOptions::new()
        .with_cancel(cancel)
        .on_progress(move |_| trigger.cancel());

    let source = UploadSource::from_bytes("cancel.bin", payload(40));
    let err = client
        .upload(&source, UploadCategory::Posts, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Cancelled));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = UploadOptions::new().with_cancel(cancel);

    for size in [8, 40] {
        let source = UploadSource::from_bytes("x.bin", payload(size));
        let err = client
            .upload(&source, UploadCategory::Posts, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }
    any.assert_async().await;
}

#[tokio::test]
async fn file_source_is_uploaded_chunk_by_chunk() {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .unwrap();
    file.write_all(&payload(24)).unwrap();
    file.flush().unwrap();

    let mut server = Server::new_async().await;
    let mocks = [
        chunk_mock(&mut server, 0, 3, "").await,
        chunk_mock(&mut server, 1, 3, "").await,
        chunk_mock(&mut server, 2, 3, "/uploads/posts/from-disk.txt").await,
    ];

    let client = signed_in_client(&server.url()).with_upload_policy(small_policy());
    let result = client
        .upload_file(file.path(), UploadCategory::Posts)
        .await
        .unwrap();

    assert_eq!(result.url, "/uploads/posts/from-disk.txt");
    assert_eq!(result.size, 24);
    assert_eq!(result.mime_type, "text/plain");
    for mock in mocks {
        mock.assert_async().await;
    }
}
