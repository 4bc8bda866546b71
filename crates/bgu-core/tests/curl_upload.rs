//! libcurl transport against a local upload server.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use bgu_core::control::AbortSignal;
use bgu_core::events::UploadEvent;
use bgu_core::job::{BodyType, JobSpec};
use bgu_core::network::{Capabilities, NetworkCandidate, NetworkId, TransportKind};
use bgu_core::retry::TransferError;
use bgu_core::transport::{CurlTransport, TransferRequest, Transport};
use bgu_core::Uploader;
use common::upload_server::{self, UploadServerOptions};

fn request(spec: JobSpec) -> TransferRequest {
    TransferRequest {
        job: Arc::new(spec.validate(0).unwrap()),
        network: NetworkCandidate {
            id: NetworkId(1),
            caps: Capabilities::usable(TransportKind::Ethernet),
        },
    }
}

fn payload() -> Vec<u8> {
    (0..64 * 1024u32).map(|i| (i % 251) as u8).collect()
}

#[test]
fn raw_upload_sends_file_as_body() {
    let server = upload_server::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.bin");
    let data = payload();
    std::fs::write(&path, &data).unwrap();

    let mut spec = JobSpec::raw(server.url.clone(), &path).with_id("raw");
    spec.method = Some("put".into());
    spec.headers.insert("X-Upload-Token".into(), "abc123".into());

    let mut seen = Vec::new();
    let response = CurlTransport::default()
        .send(&request(spec), &mut |n| seen.push(n), &AbortSignal::new())
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body, r#"{"ok":true}"#);
    assert_eq!(response.headers.get("X-Request-Count").map(String::as_str), Some("1"));
    assert!(seen.iter().all(|&n| n <= data.len() as u64));

    let received = server.received();
    assert_eq!(received.len(), 1);
    let req = &received[0];
    assert_eq!(req.method, "PUT");
    assert_eq!(req.path, "/upload");
    assert_eq!(req.header("x-upload-token"), Some("abc123"));
    assert_eq!(req.body, data);
}

#[test]
fn multipart_upload_carries_field_and_parameters() {
    let server = upload_server::start_with_options(UploadServerOptions {
        status: 200,
        response_body: "stored".into(),
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, b"not really a jpeg").unwrap();

    let mut parameters = BTreeMap::new();
    parameters.insert("album".to_string(), "holidays".to_string());
    let spec = JobSpec {
        body_type: BodyType::Multipart,
        field: Some("media".into()),
        parameters: Some(parameters),
        ..JobSpec::raw(server.url.clone(), &path)
    };

    let response = CurlTransport::default()
        .send(&request(spec), &mut |_| {}, &AbortSignal::new())
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "stored");

    let received = server.received();
    let req = &received[0];
    assert_eq!(req.method, "POST");
    assert!(req
        .header("content-type")
        .is_some_and(|v| v.starts_with("multipart/form-data")));
    let body = String::from_utf8_lossy(&req.body);
    assert!(body.contains(r#"name="media""#));
    assert!(body.contains(r#"filename="photo.jpg""#));
    assert!(body.contains("not really a jpeg"));
    assert!(body.contains(r#"name="album""#));
    assert!(body.contains("holidays"));
}

#[test]
fn raised_abort_stops_the_transfer() {
    let server = upload_server::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.bin");
    std::fs::write(&path, payload()).unwrap();

    let abort = AbortSignal::new();
    abort.abort();
    let err = CurlTransport::default()
        .send(
            &request(JobSpec::raw(server.url.clone(), &path)),
            &mut |_| {},
            &abort,
        )
        .unwrap_err();
    assert!(matches!(err, TransferError::Aborted), "got {:?}", err);
}

#[test]
fn refused_connection_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.bin");
    std::fs::write(&path, b"x").unwrap();

    let url = format!("http://127.0.0.1:{}/upload", port);
    let err = CurlTransport::default()
        .send(&request(JobSpec::raw(url, &path)), &mut |_| {}, &AbortSignal::new())
        .unwrap_err();
    assert!(matches!(err, TransferError::Curl(_)), "got {:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn uploader_completes_through_curl() {
    let server = upload_server::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.bin");
    let data = payload();
    std::fs::write(&path, &data).unwrap();

    let cfg = common::fast_config();
    let (_monitor, resolver) = common::network(&cfg, |m| {
        m.on_available(
            NetworkId(7),
            Some(Capabilities::usable(TransportKind::Ethernet)),
        )
    });
    let (sink, mut events) = common::channel_sink();
    let uploader = Uploader::builder(cfg, Arc::new(CurlTransport::default()), resolver)
        .event_sink(sink)
        .build();

    let id = uploader
        .start(JobSpec::raw(server.url.clone(), &path).with_id("e2e"))
        .unwrap();
    let evs = common::events_until_terminal(&mut events, &id).await;
    common::assert_lifecycle(&evs);
    match evs.last() {
        Some(UploadEvent::Completed {
            response_code,
            response_body,
            ..
        }) => {
            assert_eq!(*response_code, 201);
            assert_eq!(response_body, r#"{"ok":true}"#);
        }
        other => panic!("expected completed, got {:?}", other),
    }
    assert_eq!(server.received()[0].body, data);
}
