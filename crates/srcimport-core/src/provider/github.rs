//! GitHub file provider.
//!
//! Content comes from the raw host
//! (`https://raw.githubusercontent.com/{owner}/{repo}/{ref}/{path}`); the
//! last-modified timestamp comes from the commits API, asking for the most
//! recent commit touching the file on the given ref. Both hosts are
//! configurable so tests (and GitHub Enterprise setups) can point elsewhere.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use srcimport_config::GitHubConfig;

use crate::BoxFuture;
use crate::auth::GitHubAuth;

use super::http::check_status;
use super::{FileProvider, GitHubRef, ProviderError, SourceRef};

/// Serves `github`-scheme sources.
pub struct GitHubFileProvider {
    client: Client,
    auth: GitHubAuth,
    api_host: String,
    raw_host: String,
}

impl GitHubFileProvider {
    pub fn new(client: Client, auth: GitHubAuth, config: &GitHubConfig) -> Self {
        Self {
            client,
            auth,
            api_host: config.api_host.clone(),
            raw_host: config.raw_host.clone(),
        }
    }

    fn github_ref<'a>(source: &'a SourceRef) -> Result<&'a GitHubRef, ProviderError> {
        match source {
            SourceRef::GitHub(gh) => Ok(gh),
            other => Err(ProviderError::InvalidSource {
                input: other.to_string(),
                message: "not a github reference".to_string(),
            }),
        }
    }

    fn content_url(&self, gh: &GitHubRef) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_host, gh.owner, gh.repo, gh.reference, gh.path
        )
    }

    fn commits_url(&self, gh: &GitHubRef) -> String {
        format!(
            "{}/repos/{}/{}/commits?sha={}&path=/{}&per_page=1",
            self.api_host, gh.owner, gh.repo, gh.reference, gh.path
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token.expose());
        }
        request
    }
}

impl FileProvider for GitHubFileProvider {
    fn scheme(&self) -> &'static str {
        "github"
    }

    fn last_modified<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ProviderError>> {
        Box::pin(async move {
            let gh = Self::github_ref(source)?;
            let url = self.commits_url(gh);
            debug!(%url, "querying commits API");

            let response = self.get(&url).send().await?;
            check_status(&response, &url)?;

            let commits: Vec<CommitSummary> = response.json().await?;
            let Some(date) = commits
                .into_iter()
                .next()
                .and_then(|c| c.commit.committer)
                .map(|sig| sig.date)
            else {
                return Ok(None);
            };

            match DateTime::parse_from_rfc3339(&date) {
                Ok(parsed) => Ok(Some(parsed.with_timezone(&Utc))),
                Err(error) => {
                    warn!(%url, %date, %error, "ignoring unparsable commit date");
                    Ok(None)
                }
            }
        })
    }

    fn fetch<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let gh = Self::github_ref(source)?;
            let url = self.content_url(gh);
            debug!(%url, "fetching raw content");

            let response = self.get(&url).send().await?;
            check_status(&response, &url)?;

            Ok(response.bytes().await?.to_vec())
        })
    }
}

// ── Commits API types (private) ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CommitSummary {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}
