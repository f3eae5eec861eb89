//! File providers: local disk, HTTPS, and GitHub.
//!
//! Each provider serves one URI scheme and answers two questions — when was
//! the source last modified, and what are its bytes. Providers share a
//! single [`reqwest::Client`] built once from [`NetworkConfig`] and passed
//! in explicitly; there are no process-wide singletons.

mod github;
mod http;
mod local;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use srcimport_config::NetworkConfig;

use crate::BoxFuture;

pub use github::GitHubFileProvider;
pub use http::HttpFileProvider;
pub use local::LocalFileProvider;

/// Errors from source-reference parsing and content retrieval.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid source reference {input:?}: {message}")]
    InvalidSource { input: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    fn invalid(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSource {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// A GitHub blob reference: `github:owner@repo/REF/path/to/file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRef {
    pub owner: String,
    pub repo: String,
    /// Branch, tag, or commit hash.
    pub reference: String,
    /// Path of the file within the repository, no leading slash.
    pub path: String,
}

impl GitHubRef {
    /// Parse the part after the `github:` scheme.
    fn parse(input: &str, rest: &str) -> Result<Self, ProviderError> {
        let (owner_repo, remainder) = rest
            .split_once('/')
            .ok_or_else(|| ProviderError::invalid(input, "file path is not found"))?;
        let (owner, repo) = owner_repo
            .split_once('@')
            .ok_or_else(|| ProviderError::invalid(input, "user and repo name is not found"))?;
        if owner.trim().is_empty() || repo.trim().is_empty() {
            return Err(ProviderError::invalid(input, "user or repo name is empty"));
        }
        let (reference, path) = remainder
            .split_once('/')
            .ok_or_else(|| ProviderError::invalid(input, "no branch, tag or commit hash"))?;
        if reference.trim().is_empty() {
            return Err(ProviderError::invalid(
                input,
                "branch, tag or commit hash is empty",
            ));
        }
        if path.trim().is_empty() {
            return Err(ProviderError::invalid(input, "file path is empty"));
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        })
    }
}

/// A parsed input reference, dispatched to a provider by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Local(PathBuf),
    Https(String),
    GitHub(GitHubRef),
}

impl SourceRef {
    /// Parse a CLI input: a `github:` reference, an `https://` URL, or
    /// anything else as a local path.
    pub fn parse(input: &str) -> Result<Self, ProviderError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::invalid(input, "empty input"));
        }
        if let Some(rest) = trimmed.strip_prefix("github:") {
            return Ok(Self::GitHub(GitHubRef::parse(trimmed, rest)?));
        }
        if trimmed.starts_with("https://") {
            return Ok(Self::Https(trimmed.to_string()));
        }
        if let Some(rest) = trimmed.strip_prefix("http://") {
            // Plain http is confined to loopback hosts (local origins).
            if is_loopback_host(rest) {
                return Ok(Self::Https(trimmed.to_string()));
            }
            return Err(ProviderError::invalid(
                input,
                "plain http is not supported; use https",
            ));
        }
        Ok(Self::Local(PathBuf::from(trimmed)))
    }

    /// The scheme used to pick a provider from the registry.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Local(_) => "file",
            Self::Https(_) => "https",
            Self::GitHub(_) => "github",
        }
    }

    /// The source's file name, used to name the destination when the
    /// output path is a directory.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Local(path) => path.file_name().and_then(|n| n.to_str()),
            Self::Https(url) => {
                let path = url
                    .split_once("://")
                    .map_or(url.as_str(), |(_, rest)| rest);
                let path = path
                    .split_once(['?', '#'])
                    .map_or(path, |(before, _)| before);
                match path.rsplit_once('/') {
                    Some((_, name)) if !name.is_empty() => Some(name),
                    _ => None,
                }
            }
            Self::GitHub(gh) => gh.path.rsplit('/').next().filter(|n| !n.is_empty()),
        }
    }
}

fn is_loopback_host(after_scheme: &str) -> bool {
    let authority = after_scheme
        .split_once('/')
        .map_or(after_scheme, |(host, _)| host);
    let host = if let Some(bracketed) = authority.strip_prefix('[') {
        bracketed
            .split_once(']')
            .map_or(bracketed, |(host, _)| host)
    } else {
        authority
            .rsplit_once(':')
            .map_or(authority, |(host, _)| host)
    };
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Https(url) => write!(f, "{url}"),
            Self::GitHub(gh) => write!(
                f,
                "github:{}@{}/{}/{}",
                gh.owner, gh.repo, gh.reference, gh.path
            ),
        }
    }
}

/// Core trait for file providers.
///
/// Implementations must be `Send + Sync` and are consumed through
/// `Box<dyn FileProvider>`, hence the [`BoxFuture`] return types.
pub trait FileProvider: Send + Sync {
    /// The URI scheme this provider serves.
    fn scheme(&self) -> &'static str;

    /// When the source was last modified. `Ok(None)` means the source
    /// exists but carries no usable timestamp.
    fn last_modified<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ProviderError>>;

    /// The source's content bytes.
    fn fetch<'a>(&'a self, source: &'a SourceRef)
    -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;
}

/// Registry of providers, keyed by scheme.
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Box<dyn FileProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its scheme.
    pub fn register(&mut self, provider: Box<dyn FileProvider>) {
        self.providers.insert(provider.scheme(), provider);
    }

    /// Look up a provider by scheme.
    pub fn get(&self, scheme: &str) -> Option<&dyn FileProvider> {
        self.providers.get(scheme).map(|p| p.as_ref())
    }

    /// List registered schemes.
    pub fn schemes(&self) -> Vec<&'static str> {
        let mut schemes: Vec<_> = self.providers.keys().copied().collect();
        schemes.sort_unstable();
        schemes
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the shared HTTP client from network configuration.
pub fn build_http_client(network: &NetworkConfig) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(network.timeout_secs))
        .user_agent(&network.user_agent)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_local_path() {
        let source = SourceRef::parse("src/Foo.cs").unwrap();
        assert_eq!(source, SourceRef::Local(PathBuf::from("src/Foo.cs")));
        assert_eq!(source.scheme(), "file");
        assert_eq!(source.file_name(), Some("Foo.cs"));
    }

    #[test]
    fn test_parse_https_url() {
        let source = SourceRef::parse("https://example.com/a/b/File.cs?raw=1").unwrap();
        assert_eq!(source.scheme(), "https");
        assert_eq!(source.file_name(), Some("File.cs"));
    }

    #[test]
    fn test_plain_http_rejected() {
        assert!(SourceRef::parse("http://example.com/f.cs").is_err());
    }

    #[test]
    fn test_plain_http_allowed_for_loopback() {
        for url in [
            "http://127.0.0.1:8080/f.cs",
            "http://localhost/f.cs",
            "http://[::1]:9000/f.cs",
        ] {
            let source = SourceRef::parse(url).unwrap();
            assert_eq!(source.scheme(), "https", "{url}");
        }
    }

    #[test]
    fn test_parse_github_reference() {
        let source = SourceRef::parse("github:octocat@hello/main/src/Program.cs").unwrap();
        let SourceRef::GitHub(gh) = &source else {
            panic!("expected github ref");
        };
        assert_eq!(gh.owner, "octocat");
        assert_eq!(gh.repo, "hello");
        assert_eq!(gh.reference, "main");
        assert_eq!(gh.path, "src/Program.cs");
        assert_eq!(source.file_name(), Some("Program.cs"));
        assert_eq!(
            source.to_string(),
            "github:octocat@hello/main/src/Program.cs"
        );
    }

    #[test]
    fn test_malformed_github_references_rejected() {
        // Every truncation of the grammar fails with a descriptive error.
        for input in [
            "github:",
            "github:/",
            "github:@",
            "github:@/",
            "github:u@",
            "github:u@/",
            "github:@r",
            "github:@r/",
            "github:u@r",
            "github:u@r/",
            "github:u@r/b",
            "github:u@r/b/",
        ] {
            assert!(
                SourceRef::parse(input).is_err(),
                "expected {input:?} to be rejected"
            );
        }
        assert!(SourceRef::parse("github:u@r/b/f").is_ok());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(SourceRef::parse("").is_err());
        assert!(SourceRef::parse("   ").is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(LocalFileProvider));
        assert!(registry.get("file").is_some());
        assert!(registry.get("https").is_none());
        assert_eq!(registry.schemes(), vec!["file"]);
    }
}
