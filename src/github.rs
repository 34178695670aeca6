//! Optional GitHub upload after a CLI generation.
//!
//! Creates an empty public repository named after the generated project so
//! the user can push the output straight away. Only runs when GITHUB_TOKEN
//! is configured; failure is reported but never fails the generation.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

const GITHUB_REPOS_URL: &str = "https://api.github.com/user/repos";

#[derive(Deserialize)]
struct CreateRepoResponse {
    html_url: String,
}

/// Create a public repository and return its web URL.
pub async fn create_repository(token: &str, name: &str) -> Result<String> {
    // GitHub rejects requests without a User-Agent.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("forged/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let resp = client
        .post(GITHUB_REPOS_URL)
        .bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
        .json(&serde_json::json!({
            "name": name,
            "private": false,
        }))
        .send()
        .await
        .context("GitHub request failed")?;

    let status = resp.status();
    if status != reqwest::StatusCode::CREATED {
        let body = resp.text().await.unwrap_or_default();
        bail!("GitHub repository creation failed ({status}): {body}");
    }

    let body: CreateRepoResponse = resp
        .json()
        .await
        .context("could not decode GitHub response")?;
    Ok(body.html_url)
}
