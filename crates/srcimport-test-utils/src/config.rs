//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised
//! [`AppConfig`](srcimport_config::AppConfig) values without repeating
//! boilerplate across crate boundaries.

use srcimport_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .timeout_secs(2)
///     .raw_host("http://127.0.0.1:4242")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.network.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, agent: &str) -> Self {
        self.config.network.user_agent = agent.to_string();
        self
    }

    pub fn token_env_vars(mut self, vars: &[&str]) -> Self {
        self.config.github.token_env_vars = vars.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Point the GitHub API host at a mock origin. Tests construct configs
    /// directly, so plain-http addresses are fine here.
    pub fn api_host(mut self, host: &str) -> Self {
        self.config.github.api_host = host.to_string();
        self
    }

    /// Point the GitHub raw-content host at a mock origin.
    pub fn raw_host(mut self, host: &str) -> Self {
        self.config.github.raw_host = host.to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
