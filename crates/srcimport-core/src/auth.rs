//! GitHub token lookup.
//!
//! The token is only ever read from the environment — never from config
//! files or flags — and is held in a zeroize-on-drop wrapper whose `Debug`
//! output is redacted. Log lines mention the variable a token came from,
//! never the value.

use std::fmt;

use tracing::{debug, info};
use zeroize::Zeroize;

use srcimport_config::GitHubConfig;

/// A token value with automatic zeroization.
pub struct TokenValue {
    inner: String,
}

impl TokenValue {
    fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the token as a string slice. Use only at the request boundary.
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValue")
            .field("inner", &"[REDACTED]")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl Drop for TokenValue {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

/// Optional GitHub credentials for API and raw-content requests.
#[derive(Debug, Default)]
pub struct GitHubAuth {
    token: Option<TokenValue>,
    source_var: Option<String>,
}

impl GitHubAuth {
    /// Probe the configured environment variables, in order; the first
    /// non-blank value wins.
    pub fn from_env(config: &GitHubConfig) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Probe with a caller-supplied lookup instead of the process
    /// environment. Tests use this to avoid mutating global env state.
    pub fn from_lookup(config: &GitHubConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for var in &config.token_env_vars {
            if let Some(value) = lookup(var) {
                if !value.trim().is_empty() {
                    info!(var = %var, "GitHub token loaded");
                    return Self {
                        token: Some(TokenValue::new(value)),
                        source_var: Some(var.clone()),
                    };
                }
            }
        }
        debug!("no GitHub token found in environment");
        Self::anonymous()
    }

    /// No credentials; requests go out unauthenticated.
    pub fn anonymous() -> Self {
        Self {
            token: None,
            source_var: None,
        }
    }

    pub fn token(&self) -> Option<&TokenValue> {
        self.token.as_ref()
    }

    /// Name of the environment variable the token came from.
    pub fn source_var(&self) -> Option<&str> {
        self.source_var.as_deref()
    }
}
