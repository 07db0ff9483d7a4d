use crate::*;

use starprobe_core::config::MIB;

#[tokio::test]
async fn test_ping_is_no_content() -> Result<()> {
    let server = spawn_server().await?;
    let resp = server.get("/ping").send().await?;
    assert_eq!(resp.status(), 204);
    assert!(resp.bytes().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_download_exact_size_and_headers() -> Result<()> {
    let server = spawn_server().await?;
    let resp = server.get("/download?size=1000").send().await?;
    assert_eq!(resp.status(), 200);

    let headers = resp.headers().clone();
    assert_eq!(headers["content-type"], "application/octet-stream");
    assert_eq!(headers["content-length"], "1000");
    assert_eq!(
        headers["cache-control"],
        "no-cache, no-store, must-revalidate"
    );

    let body = resp.bytes().await?;
    assert_eq!(body.len(), 1000);
    Ok(())
}

#[tokio::test]
async fn test_download_zero_and_negative_are_empty() -> Result<()> {
    let server = spawn_server().await?;
    for size in ["0", "-5"] {
        let resp = server.get(&format!("/download?size={size}")).send().await?;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "0");
        assert!(resp.bytes().await?.is_empty(), "size={size} should be empty");
    }
    Ok(())
}

#[tokio::test]
async fn test_download_spans_many_chunks() -> Result<()> {
    let mut config = test_config();
    config.measurement.chunk_size_bytes = 4096;
    let server = spawn_server_with(config).await?;

    let size = 4096 * 3 + 17;
    let resp = server.get(&format!("/download?size={size}")).send().await?;
    assert_eq!(resp.bytes().await?.len(), size);
    Ok(())
}

#[tokio::test]
async fn test_download_clamped_to_maximum() -> Result<()> {
    let mut config = test_config();
    config.measurement.max_download_bytes = 64 * 1024;
    config.measurement.chunk_size_bytes = 16 * 1024;
    let server = spawn_server_with(config).await?;

    let resp = server
        .get(&format!("/download?size={}", 500 * MIB))
        .send()
        .await?;
    assert_eq!(resp.headers()["content-length"], (64 * 1024).to_string());
    assert_eq!(resp.bytes().await?.len(), 64 * 1024);
    Ok(())
}

#[tokio::test]
async fn test_download_default_size() -> Result<()> {
    let mut config = test_config();
    config.measurement.default_download_bytes = 2048;
    let server = spawn_server_with(config).await?;

    for path in ["/download", "/download?size=plenty"] {
        let resp = server.get(path).send().await?;
        assert_eq!(resp.bytes().await?.len(), 2048, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn test_upload_counts_bytes() -> Result<()> {
    let server = spawn_server().await?;
    let payload = vec![7u8; 3 * 1024 * 1024 + 5];

    let resp = server.post("/upload").body(payload.clone()).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["received_bytes"], payload.len() as u64);
    assert!(body["duration_seconds"].as_f64().unwrap() > 0.0);
    assert!(body["calculated_mbps"].as_f64().unwrap() > 0.0);
    Ok(())
}

#[tokio::test]
async fn test_upload_empty_body() -> Result<()> {
    let server = spawn_server().await?;
    let resp = server.post("/upload").send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["received_bytes"], 0);
    assert_eq!(body["calculated_mbps"], 0.0);
    assert!(body["duration_seconds"].as_f64().unwrap() > 0.0);
    Ok(())
}

#[tokio::test]
async fn test_upload_above_default_body_limit() -> Result<()> {
    let server = spawn_server().await?;
    let payload = vec![0u8; 12 * 1024 * 1024];
    let resp = server.post("/upload").body(payload).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["received_bytes"], 12 * 1024 * 1024);
    Ok(())
}

#[tokio::test]
async fn test_aborted_upload_produces_no_measurement() -> Result<()> {
    let server = spawn_server().await?;
    let frames: Vec<Result<bytes::Bytes, std::io::Error>> = vec![
        Ok(bytes::Bytes::from(vec![1u8; 64 * 1024])),
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionAborted,
            "client gave up",
        )),
    ];
    let body = reqwest::Body::wrap_stream(futures::stream::iter(frames));

    match server.post("/upload").body(body).send().await {
        // The client usually fails while sending; if the server answers
        // first it must be with an error status.
        Err(_) => {}
        Ok(resp) => {
            assert_eq!(resp.status(), 400);
            let text = resp.text().await?;
            assert!(!text.contains("calculated_mbps"), "{text}");
        }
    }

    // The server keeps serving after an aborted body.
    assert_eq!(server.get("/ping").send().await?.status(), 204);
    Ok(())
}
