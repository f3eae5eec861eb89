//! HTTPS file provider.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use tracing::warn;

use crate::BoxFuture;

use super::{FileProvider, ProviderError, SourceRef};

/// Serves `https`-scheme sources with a shared [`Client`].
pub struct HttpFileProvider {
    client: Client,
}

impl HttpFileProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn url<'a>(source: &'a SourceRef) -> Result<&'a str, ProviderError> {
        match source {
            SourceRef::Https(url) => Ok(url),
            other => Err(ProviderError::InvalidSource {
                input: other.to_string(),
                message: "not an https url".to_string(),
            }),
        }
    }
}

impl FileProvider for HttpFileProvider {
    fn scheme(&self) -> &'static str {
        "https"
    }

    fn last_modified<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ProviderError>> {
        Box::pin(async move {
            let url = Self::url(source)?;
            let response = self.client.head(url).send().await?;
            check_status(&response, url)?;

            Ok(parse_last_modified(response.headers(), url))
        })
    }

    fn fetch<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let url = Self::url(source)?;
            let response = self.client.get(url).send().await?;
            check_status(&response, url)?;

            Ok(response.bytes().await?.to_vec())
        })
    }
}

pub(super) fn check_status(response: &reqwest::Response, url: &str) -> Result<(), ProviderError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Read a `Last-Modified` header. A missing or unparsable header is not an
/// error — the caller just proceeds without an up-to-date check.
pub(super) fn parse_last_modified(
    headers: &header::HeaderMap,
    url: &str,
) -> Option<DateTime<Utc>> {
    let raw = headers.get(header::LAST_MODIFIED)?.to_str().ok()?;
    match DateTime::parse_from_rfc2822(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(error) => {
            warn!(%url, %raw, %error, "ignoring unparsable Last-Modified header");
            None
        }
    }
}
