//! Shared HTTP request helpers for CLI commands.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Where the daemon lives and who we are to it.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: Option<u64>,
}

impl Target {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn with_user(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.user {
            Some(id) => req.header("x-user-id", id.to_string()),
            None => req,
        }
    }
}

pub fn connect_error(url: &str) -> String {
    format!("failed to connect to starprobed at {} — is it running?", url)
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(target: &Target, path: &str) -> Result<T> {
    let url = target.url(path);
    let resp = target
        .with_user(reqwest::Client::new().get(&url))
        .send()
        .await
        .with_context(|| connect_error(&url))?;
    decode(resp).await
}

pub async fn post_json_body<T, R>(target: &Target, path: &str, body: &T) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    let url = target.url(path);
    let resp = target
        .with_user(reqwest::Client::new().post(&url).json(body))
        .send()
        .await
        .with_context(|| connect_error(&url))?;
    decode(resp).await
}

async fn decode<R: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<R> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        bail!("request failed ({}): {}", status, text);
    }
    resp.json::<R>().await.context("failed to parse response")
}
