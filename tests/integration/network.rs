use crate::*;

#[tokio::test]
async fn test_loopback_caller_gets_development_record() -> Result<()> {
    let server = spawn_server().await?;
    let body: serde_json::Value = server.get("/network-info").send().await?.json().await?;

    assert_eq!(body["ip"], "127.0.0.1");
    assert_eq!(body["isp"], "Localhost Development");
    assert_eq!(body["is_starlink"], true);
    assert_eq!(server.lookups(), 0);
    Ok(())
}

#[tokio::test]
async fn test_forwarded_satellite_address() -> Result<()> {
    let server = spawn_server().await?;
    let body: serde_json::Value = server
        .get("/network-info")
        .header("x-forwarded-for", format!("{SATELLITE_IP}, 10.0.0.1"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["ip"], SATELLITE_IP);
    assert_eq!(body["isp"], "SpaceX Services, Inc.");
    assert_eq!(body["is_starlink"], true);
    assert!(body["details"].as_str().unwrap().contains("14593"));
    assert_eq!(server.lookups(), 1);
    Ok(())
}

#[tokio::test]
async fn test_forwarded_terrestrial_address() -> Result<()> {
    let server = spawn_server().await?;
    let body: serde_json::Value = server
        .get("/network-info")
        .header("x-forwarded-for", CABLE_IP)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["isp"], "Comcast Cable");
    assert_eq!(body["is_starlink"], false);
    Ok(())
}

#[tokio::test]
async fn test_lookup_failure_degrades() -> Result<()> {
    let server = spawn_server().await?;
    let resp = server
        .get("/network-info")
        .header("x-forwarded-for", UNREACHABLE_IP)
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["ip"], UNREACHABLE_IP);
    assert_eq!(body["isp"], "Unknown");
    assert_eq!(body["is_starlink"], false);
    Ok(())
}

#[tokio::test]
async fn test_repeated_calls_look_up_again() -> Result<()> {
    let server = spawn_server().await?;
    for _ in 0..3 {
        server
            .get("/network-info")
            .header("x-forwarded-for", CABLE_IP)
            .send()
            .await?;
    }
    assert_eq!(server.lookups(), 3);
    Ok(())
}

#[tokio::test]
async fn test_forwarded_garbage_is_not_looked_up() -> Result<()> {
    let server = spawn_server().await?;
    let body: serde_json::Value = server
        .get("/network-info")
        .header("x-forwarded-for", "x/../../admin/reset?token=1")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["isp"], "Unknown");
    assert_eq!(body["is_starlink"], false);
    assert_eq!(server.lookups(), 0);
    Ok(())
}
