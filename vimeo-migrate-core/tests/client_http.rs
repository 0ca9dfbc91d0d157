use serde_json::json;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vimeo_migrate_core::client::{VimeoClient, TUS_CONTENT_TYPE, VIMEO_ACCEPT};
use vimeo_migrate_core::config::{AccountConfig, MigrationConfig, RetryConfig};
use vimeo_migrate_core::contract::{DestinationLibrary, SourceLibrary, UploadTicket};
use vimeo_migrate_core::download::download_video;
use vimeo_migrate_core::error::ApiError;
use vimeo_migrate_core::migrate::{migrate, ItemOutcome};
use vimeo_migrate_core::resolve::resolve_video;
use vimeo_migrate_core::upload::{upload_video, UploadError};
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn no_retry_client(server: &MockServer, token: &str) -> VimeoClient {
    VimeoClient::new(&server.uri(), token)
        .unwrap()
        .with_retry(RetryConfig::disabled())
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 2,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

fn listing_page(uris: &[&str], next: Option<&str>) -> serde_json::Value {
    let data: Vec<_> = uris
        .iter()
        .map(|uri| json!({ "uri": uri, "name": format!("Video {uri}") }))
        .collect();
    json!({ "total": uris.len(), "data": data, "paging": { "next": next } })
}

#[tokio::test]
async fn listing_follows_next_links_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/projects/55/videos"))
        .and(query_param("per_page", "2"))
        .and(query_param("sort", "alphabetical"))
        .and(query_param("direction", "asc"))
        .and(query_param_is_missing("page"))
        .and(header("Authorization", "Bearer src-token"))
        .and(header("Accept", VIMEO_ACCEPT))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_page(
            &["/videos/1", "/videos/2"],
            Some("/me/projects/55/videos?page=2&per_page=2"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/projects/55/videos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_page(
            &["/videos/3", "/videos/4"],
            Some("/me/projects/55/videos?page=3&per_page=2"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/projects/55/videos"))
        .and(query_param("page", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing_page(&["/videos/5"], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = no_retry_client(&server, "src-token").with_page_size(2);
    let videos = client.list_folder_videos("55").await.unwrap();

    let uris: Vec<_> = videos.iter().filter_map(|v| v.uri.as_deref()).collect();
    assert_eq!(
        uris,
        vec!["/videos/1", "/videos/2", "/videos/3", "/videos/4", "/videos/5"]
    );
}

#[tokio::test]
async fn listing_fails_when_any_page_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/projects/55/videos"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_page(
            &["/videos/1"],
            Some("/me/projects/55/videos?page=2"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/projects/55/videos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = no_retry_client(&server, "src-token");
    let result = client.list_folder_videos("55").await;

    assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
}

#[tokio::test]
async fn resolver_returns_widest_link_and_title() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/42",
            "name": "My Video",
            "download": [
                { "quality": "sd", "width": 240, "height": 180, "link": "https://cdn.example/240" },
                { "quality": "hd", "width": 1080, "height": 720, "link": "https://cdn.example/1080" },
                { "quality": "hd", "width": 720, "height": 480, "link": "https://cdn.example/720" }
            ]
        })))
        .mount(&server)
        .await;

    let client = no_retry_client(&server, "src-token");
    let resolved = resolve_video(&client, "/videos/42").await.unwrap();

    assert_eq!(resolved.name, "My Video");
    assert_eq!(resolved.link, "https://cdn.example/1080");
}

#[tokio::test]
async fn resolver_returns_none_when_detail_request_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = no_retry_client(&server, "src-token");
    assert!(resolve_video(&client, "/videos/42").await.is_none());
}

#[tokio::test]
async fn download_streams_body_into_underscored_file() {
    let server = MockServer::start().await;
    let body = vec![7u8; 20_000];

    Mock::given(method("GET"))
        .and(path("/play/42"))
        .and(header("Authorization", "Bearer src-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("My_Video.mp4"), b"stale contents").unwrap();

    let client = no_retry_client(&server, "src-token");
    let link = format!("{}/play/42", server.uri());
    let path = download_video(&client, &link, "My Video", dir.path())
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("My_Video.mp4"));
    assert_eq!(std::fs::read(&path).unwrap(), body);
}

#[tokio::test]
async fn download_body_cut_off_mid_stream_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 1000\r\n\r\n")
            .await
            .unwrap();
        socket.write_all(&[7u8; 100]).await.unwrap();
        let _ = socket.shutdown().await;
    });

    let dir = tempdir().unwrap();
    let client = VimeoClient::new(&format!("http://{addr}"), "src-token")
        .unwrap()
        .with_retry(RetryConfig::disabled());
    let link = format!("http://{addr}/play/42");
    let result = download_video(&client, &link, "My Video", dir.path()).await;

    assert!(matches!(result, Err(ApiError::Http(_))), "got {result:?}");
    let partial = dir.path().join("My_Video.mp4");
    assert!(partial.exists(), "partial file is left in place");
    assert!(std::fs::metadata(&partial).unwrap().len() < 1000);
}

#[tokio::test]
async fn download_error_status_claims_no_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/play/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let client = no_retry_client(&server, "src-token");
    let link = format!("{}/play/42", server.uri());
    let result = download_video(&client, &link, "My Video", dir.path()).await;

    assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    assert!(!dir.path().join("My_Video.mp4").exists());
}

async fn mount_ticket(server: &MockServer, size: u64, tus_path: &str) {
    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .and(header("Authorization", "Bearer dst-token"))
        .and(body_partial_json(json!({
            "upload": { "approach": "tus", "size": size },
            "name": "My Video"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/987",
            "upload": {
                "approach": "tus",
                "upload_link": format!("{}{}", server.uri(), tus_path)
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_sends_file_as_single_tus_chunk_then_moves() {
    let server = MockServer::start().await;
    let contents = b"fake mp4 payload".to_vec();
    let size = contents.len() as u64;

    mount_ticket(&server, size, "/tus/abc").await;

    Mock::given(method("PATCH"))
        .and(path("/tus/abc"))
        .and(header("Tus-Resumable", "1.0.0"))
        .and(header("Upload-Offset", "0"))
        .and(header("Content-Type", TUS_CONTENT_TYPE))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("Tus-Resumable", "1.0.0")
                .insert_header("Upload-Offset", size.to_string().as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/projects/777/videos/987"))
        .and(header("Authorization", "Bearer dst-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let file = dir.path().join("My_Video.mp4");
    std::fs::write(&file, &contents).unwrap();

    let client = no_retry_client(&server, "dst-token");
    let uploaded = upload_video(&client, &file, "My Video", "777").await.unwrap();

    assert_eq!(uploaded.uri, "/videos/987");
    assert_eq!(uploaded.video_id, "987");

    let requests = server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|request| request.method.as_str() == "PATCH")
        .expect("tus PATCH should have been sent");
    assert_eq!(patch.body, contents);
}

#[tokio::test]
async fn partial_tus_acknowledgement_is_an_error() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let file = dir.path().join("clip.mp4");
    std::fs::write(&file, b"0123456789").unwrap();

    Mock::given(method("PATCH"))
        .and(path("/tus/partial"))
        .respond_with(ResponseTemplate::new(204).insert_header("Upload-Offset", "4"))
        .mount(&server)
        .await;

    let client = no_retry_client(&server, "dst-token");
    let ticket = UploadTicket {
        uri: "/videos/1".into(),
        upload_link: format!("{}/tus/partial", server.uri()),
    };
    let result = client.transfer_file(&ticket, &file, 10).await;

    assert!(matches!(
        result,
        Err(ApiError::IncompleteTransfer {
            expected: 10,
            actual: 4
        })
    ));
}

#[tokio::test]
async fn ticket_failure_aborts_upload_before_transfer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let file = dir.path().join("My_Video.mp4");
    std::fs::write(&file, b"payload").unwrap();

    let client = no_retry_client(&server, "dst-token");
    let result = upload_video(&client, &file, "My Video", "777").await;

    assert!(matches!(result, Err(UploadError::Ticket(_))));
}

#[tokio::test]
async fn move_is_retried_after_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/me/projects/777/videos/987"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/projects/777/videos/987"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = VimeoClient::new(&server.uri(), "dst-token")
        .unwrap()
        .with_retry(fast_retry());

    client.move_to_folder("777", "987").await.unwrap();
}

#[tokio::test]
async fn end_to_end_migration_against_mock_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/projects/111/videos"))
        .and(header("Authorization", "Bearer src-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "uri": "/videos/1", "name": "First Video" },
                { "uri": "/videos/2", "name": "Second Video" }
            ],
            "paging": { "next": null }
        })))
        .mount(&server)
        .await;

    for (id, name) in [("1", "First Video"), ("2", "Second Video")] {
        Mock::given(method("GET"))
            .and(path(format!("/videos/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "download": [
                    { "width": 1920, "link": format!("{}/play/{id}", server.uri()) }
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/play/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .and(header("Authorization", "Bearer dst-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/500",
            "upload": { "upload_link": format!("{}/tus/500", server.uri()) }
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/tus/500"))
        .respond_with(ResponseTemplate::new(204).insert_header("Upload-Offset", "5"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/projects/222/videos/500"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut config = MigrationConfig::new(
        AccountConfig {
            access_token: "src-token".into(),
            folder_id: "111".into(),
        },
        AccountConfig {
            access_token: "dst-token".into(),
            folder_id: "222".into(),
        },
    );
    config.api_base_url = server.uri();
    config.download_dir = dir.path().join("temp_vimeo_downloads");
    config.retry = RetryConfig::disabled();

    let source = VimeoClient::from_config(&config, &config.source).unwrap();
    let destination = VimeoClient::from_config(&config, &config.destination).unwrap();

    let report = migrate(&config, &source, &destination).await.unwrap();

    assert_eq!(report.migrated(), 2);
    assert_eq!(report.temp_files_removed, 2);
    assert!(report
        .items
        .iter()
        .all(|item| item.outcome == ItemOutcome::Migrated { new_uri: "/videos/500".into() }));
    assert_eq!(
        std::fs::read_dir(&config.download_dir).unwrap().count(),
        0,
        "download directory should be empty after migration"
    );
}
