//! Release host adapter: release listings and per-release checksum files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use scarb_dist_schema::{UPSTREAM_OWNER, UPSTREAM_PROJECT};
use serde::Deserialize;
use tracing::{debug, warn};

/// Page size requested from the releases endpoint (the API maximum).
const PER_PAGE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Build an authenticated GitHub client
pub fn build_client(token: Option<&str>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_static(crate::USER_AGENT),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/vnd.github+json"),
    );

    if let Some(t) = token {
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {t}"))?,
        );
    }

    Ok(Client::builder().default_headers(headers).build()?)
}

/// Read-only view of the upstream repository on the release host.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    release_host: String,
}

impl GithubClient {
    pub fn new(client: Client, api_url: &str, release_host: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            release_host: release_host.trim_end_matches('/').to_string(),
        }
    }

    /// Every release of the upstream project, newest first, across all pages.
    pub async fn fetch_releases(&self) -> Result<Vec<GithubRelease>> {
        let url = format!(
            "{}/repos/{UPSTREAM_OWNER}/{UPSTREAM_PROJECT}/releases",
            self.api_url
        );
        let mut releases = Vec::new();

        for page in 1.. {
            debug!("fetching {url} page {page}");
            let batch: Vec<GithubRelease> = self
                .client
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await
                .with_context(|| format!("Failed to fetch releases from {url}"))?
                .error_for_status()
                .with_context(|| format!("Release listing {url} returned an error"))?
                .json()
                .await
                .with_context(|| format!("Invalid release listing from {url}"))?;

            let last = batch.len() < PER_PAGE;
            releases.extend(batch);
            if last {
                break;
            }
        }

        Ok(releases)
    }

    /// URL of the `checksums.sha256` file attached to `tag`.
    pub fn checksums_url(&self, tag: &str) -> String {
        format!(
            "{}/{UPSTREAM_OWNER}/{UPSTREAM_PROJECT}/releases/download/{tag}/checksums.sha256",
            self.release_host
        )
    }

    /// Contents of the checksum file for `tag`, or `None` if it cannot be
    /// fetched.
    pub async fn fetch_checksums(&self, tag: &str) -> Option<String> {
        let url = self.checksums_url(tag);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("failed to fetch checksums for {tag}: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "failed to fetch checksums for {tag}: HTTP {}",
                response.status()
            );
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("failed to read checksums for {tag}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn release_json(tag: &str) -> String {
        format!(
            r#"{{"tag_name": "{tag}", "draft": false, "prerelease": false,
                "published_at": "2024-09-04T12:14:27Z", "body": null, "assets": []}}"#
        )
    }

    #[tokio::test]
    async fn test_fetch_releases_paginates() {
        let mut server = Server::new_async().await;
        let full: Vec<String> = (0..PER_PAGE).map(|i| release_json(&format!("v0.0.{i}"))).collect();
        let page1 = server
            .mock("GET", "/repos/software-mansion/scarb/releases")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_body(format!("[{}]", full.join(",")))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/software-mansion/scarb/releases")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body(format!("[{}]", release_json("v2.8.2")))
            .create_async()
            .await;

        let client = GithubClient::new(build_client(None).unwrap(), &server.url(), &server.url());
        let releases = client.fetch_releases().await.unwrap();

        assert_eq!(releases.len(), PER_PAGE + 1);
        assert_eq!(releases.last().unwrap().tag_name, "v2.8.2");
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/software-mansion/scarb/releases")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer secret")
            .with_body("[]")
            .create_async()
            .await;

        let client = GithubClient::new(
            build_client(Some("secret")).unwrap(),
            &server.url(),
            &server.url(),
        );
        assert!(client.fetch_releases().await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_checksums_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock(
                "GET",
                "/software-mansion/scarb/releases/download/v2.8.2/checksums.sha256",
            )
            .with_status(404)
            .create_async()
            .await;

        let client = GithubClient::new(build_client(None).unwrap(), &server.url(), &server.url());
        assert!(client.fetch_checksums("v2.8.2").await.is_none());
    }
}
