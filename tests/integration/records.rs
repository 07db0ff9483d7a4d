use crate::*;

fn measurement(hardware: u64) -> serde_json::Value {
    serde_json::json!({
        "hardware": hardware,
        "download_mbps": 182.4,
        "upload_mbps": 17.9,
        "latency_ms": 41.0,
        "jitter_ms": 6.2,
    })
}

async fn submit(
    server: &TestServer,
    user: u64,
    forwarded: Option<&str>,
    hardware: u64,
) -> Result<reqwest::Response> {
    let mut req = server
        .post("/results")
        .header("x-user-id", user.to_string())
        .json(&measurement(hardware));
    if let Some(ip) = forwarded {
        req = req.header("x-forwarded-for", ip);
    }
    Ok(req.send().await?)
}

async fn list_ids(server: &TestServer, user: u64, query: &str) -> Result<Vec<u64>> {
    let body: serde_json::Value = server
        .get(&format!("/results{query}"))
        .header("x-user-id", user.to_string())
        .send()
        .await?
        .json()
        .await?;
    Ok(body["results"]
        .as_array()
        .context("missing results")?
        .iter()
        .filter_map(|r| r["id"].as_u64())
        .collect())
}

#[tokio::test]
async fn test_identity_required() -> Result<()> {
    let server = spawn_server().await?;
    for path in ["/hardware", "/results"] {
        assert_eq!(server.get(path).send().await?.status(), 401, "{path}");
    }
    let resp = server
        .get("/hardware")
        .header("x-user-id", "not-a-number")
        .send()
        .await?;
    assert_eq!(resp.status(), 401);
    Ok(())
}

#[tokio::test]
async fn test_owner_submission_is_labelled() -> Result<()> {
    let server = spawn_server().await?;
    let hw = server.register(OWNER, "KIT-100").await?;

    let resp = submit(&server, OWNER, Some(SATELLITE_IP), hw).await?;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["hardware"], hw);
    assert_eq!(body["isp_name"], "SpaceX Services, Inc.");
    assert_eq!(body["is_starlink"], true);
    assert_eq!(body["client_ip"], SATELLITE_IP);
    assert_eq!(body["jitter_ms"], 6.2);

    let id = body["id"].as_u64().unwrap();
    let fetched: serde_json::Value = server
        .get(&format!("/results/{id}"))
        .header("x-user-id", OWNER.to_string())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["id"], id);
    Ok(())
}

#[tokio::test]
async fn test_non_owner_submission_forbidden() -> Result<()> {
    let server = spawn_server().await?;
    let hw = server.register(OWNER, "KIT-200").await?;

    let resp = submit(&server, STRANGER, Some(CABLE_IP), hw).await?;
    assert_eq!(resp.status(), 403);
    assert_eq!(server.lookups(), 0, "denied caller must not trigger a lookup");

    let list: serde_json::Value = server
        .get("/results")
        .header("x-user-id", OWNER.to_string())
        .send()
        .await?
        .json()
        .await?;
    assert!(list["results"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_hardware_not_found() -> Result<()> {
    let server = spawn_server().await?;
    let resp = submit(&server, OWNER, None, 4242).await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_admin_bypasses_ownership() -> Result<()> {
    let server = spawn_server().await?;
    let hw = server.register(OWNER, "KIT-300").await?;

    let resp = submit(&server, ADMIN, Some(CABLE_IP), hw).await?;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["is_starlink"], false);
    assert_eq!(body["isp_name"], "Comcast Cable");

    let hw_view = server
        .get(&format!("/hardware/{hw}"))
        .header("x-user-id", ADMIN.to_string())
        .send()
        .await?;
    assert_eq!(hw_view.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_hardware_visibility() -> Result<()> {
    let server = spawn_server().await?;
    let mine = server.register(OWNER, "KIT-400").await?;
    server.register(STRANGER, "KIT-401").await?;

    let resp = server
        .get(&format!("/hardware/{mine}"))
        .header("x-user-id", STRANGER.to_string())
        .send()
        .await?;
    assert_eq!(resp.status(), 403);

    let list: serde_json::Value = server
        .get("/hardware")
        .header("x-user-id", OWNER.to_string())
        .send()
        .await?
        .json()
        .await?;
    let hardware = list["hardware"].as_array().unwrap();
    assert_eq!(hardware.len(), 1);
    assert_eq!(hardware[0]["id"], mine);

    let all: serde_json::Value = server
        .get("/hardware")
        .header("x-user-id", ADMIN.to_string())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all["hardware"].as_array().unwrap().len(), 2);

    let dup = server
        .post("/hardware")
        .header("x-user-id", OWNER.to_string())
        .json(&serde_json::json!({ "serial": "KIT-400" }))
        .send()
        .await?;
    assert_eq!(dup.status(), 409);
    Ok(())
}

#[tokio::test]
async fn test_results_listing_and_limit() -> Result<()> {
    let server = spawn_server().await?;
    let a = server.register(OWNER, "KIT-500").await?;
    let b = server.register(OWNER, "KIT-501").await?;

    let mut ids = Vec::new();
    for hw in [a, b, a] {
        let body: serde_json::Value = submit(&server, OWNER, None, hw).await?.json().await?;
        ids.push(body["id"].as_u64().unwrap());
    }

    assert_eq!(list_ids(&server, OWNER, "").await?, vec![ids[2], ids[1], ids[0]]);
    assert_eq!(list_ids(&server, OWNER, "?limit=all").await?.len(), 3);
    assert_eq!(list_ids(&server, OWNER, "?limit=1").await?, vec![ids[2]]);
    assert_eq!(list_ids(&server, OWNER, "?limit=bogus").await?.len(), 3);
    assert_eq!(
        list_ids(&server, OWNER, &format!("?hardware={a}")).await?,
        vec![ids[2], ids[0]]
    );
    assert!(list_ids(&server, STRANGER, "").await?.is_empty());
    Ok(())
}
