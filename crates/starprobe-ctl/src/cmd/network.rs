//! Provider classification command.

use anyhow::Result;
use serde::Deserialize;

use super::http::{get_json, Target};

#[derive(Deserialize)]
pub struct NetworkInfo {
    pub ip: String,
    pub isp: String,
    pub is_starlink: bool,
    pub details: String,
}

pub async fn fetch(target: &Target) -> Result<NetworkInfo> {
    get_json(target, "/network-info").await
}

pub async fn cmd_network(target: &Target) -> Result<()> {
    let info = fetch(target).await?;

    println!("═══════════════════════════════════════");
    println!("  Network Provider");
    println!("═══════════════════════════════════════");
    println!("  Address   : {}", info.ip);
    println!("  ISP       : {}", info.isp);
    println!("  Satellite : {}", if info.is_starlink { "yes" } else { "no" });
    println!("  Details   : {}", info.details);

    Ok(())
}
