//! Provider and pipeline tests against an in-process HTTP origin.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use srcimport_core::pipeline::{ImportOptions, StdinPrompt, run_import};
use srcimport_core::provider::{
    FileProvider, GitHubFileProvider, HttpFileProvider, ProviderError, ProviderRegistry,
    SourceRef, build_http_client,
};
use srcimport_core::GitHubAuth;
use srcimport_test_utils::config::TestConfigBuilder;
use srcimport_test_utils::origin::{MockFile, MockOrigin};
use srcimport_test_utils::tracing_setup::init_test_tracing;

fn http_client() -> reqwest::Client {
    let config = TestConfigBuilder::new().timeout_secs(5).build();
    build_http_client(&config.network).unwrap()
}

#[tokio::test]
async fn test_http_fetch_and_last_modified() {
    init_test_tracing();
    let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let origin = MockOrigin::serve(HashMap::from([(
        "files/Widget.cs".to_string(),
        MockFile::new("public class W { }").last_modified(stamp),
    )]))
    .await;

    let provider = HttpFileProvider::new(http_client());
    let source = SourceRef::Https(origin.url("files/Widget.cs"));

    let bytes = provider.fetch(&source).await.unwrap();
    assert_eq!(bytes, b"public class W { }");

    let last_modified = provider.last_modified(&source).await.unwrap();
    assert_eq!(last_modified, Some(stamp));
}

#[tokio::test]
async fn test_http_missing_last_modified_is_none() {
    let origin = MockOrigin::serve(HashMap::from([(
        "plain.txt".to_string(),
        MockFile::new("no header"),
    )]))
    .await;

    let provider = HttpFileProvider::new(http_client());
    let source = SourceRef::Https(origin.url("plain.txt"));
    assert_eq!(provider.last_modified(&source).await.unwrap(), None);
}

#[tokio::test]
async fn test_http_404_is_not_found() {
    let origin = MockOrigin::serve(HashMap::new()).await;

    let provider = HttpFileProvider::new(http_client());
    let source = SourceRef::Https(origin.url("missing.cs"));
    assert!(matches!(
        provider.fetch(&source).await.unwrap_err(),
        ProviderError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_github_fetch_sends_bearer_token() {
    init_test_tracing();
    let origin = MockOrigin::serve(HashMap::from([(
        "octocat/hello/main/src/Program.cs".to_string(),
        MockFile::new("class P { }").expect_bearer("sekrit"),
    )]))
    .await;

    let config = TestConfigBuilder::new()
        .raw_host(&origin.base_url())
        .api_host(&origin.base_url())
        .build();
    let auth = GitHubAuth::from_lookup(&config.github, |name| {
        (name == "GH_TOKEN").then(|| "sekrit".to_string())
    });
    let provider = GitHubFileProvider::new(http_client(), auth, &config.github);

    let source = SourceRef::parse("github:octocat@hello/main/src/Program.cs").unwrap();
    let bytes = provider.fetch(&source).await.unwrap();
    assert_eq!(bytes, b"class P { }");
}

#[tokio::test]
async fn test_github_anonymous_is_rejected_by_protected_origin() {
    let origin = MockOrigin::serve(HashMap::from([(
        "octocat/hello/main/src/Program.cs".to_string(),
        MockFile::new("class P { }").expect_bearer("sekrit"),
    )]))
    .await;

    let config = TestConfigBuilder::new()
        .raw_host(&origin.base_url())
        .api_host(&origin.base_url())
        .build();
    let provider = GitHubFileProvider::new(http_client(), GitHubAuth::anonymous(), &config.github);

    let source = SourceRef::parse("github:octocat@hello/main/src/Program.cs").unwrap();
    assert!(matches!(
        provider.fetch(&source).await.unwrap_err(),
        ProviderError::Status { status: 401, .. }
    ));
}

#[tokio::test]
async fn test_github_last_modified_from_commits_api() {
    let commits = r#"[{"sha":"abc","commit":{"committer":{"name":"o","date":"2024-05-01T12:00:00Z"}}}]"#;
    let origin = MockOrigin::serve(HashMap::from([(
        "repos/octocat/hello/commits".to_string(),
        MockFile::new(commits),
    )]))
    .await;

    let config = TestConfigBuilder::new()
        .raw_host(&origin.base_url())
        .api_host(&origin.base_url())
        .build();
    let provider = GitHubFileProvider::new(http_client(), GitHubAuth::anonymous(), &config.github);

    let source = SourceRef::parse("github:octocat@hello/main/src/Program.cs").unwrap();
    let last_modified = provider.last_modified(&source).await.unwrap();
    assert_eq!(
        last_modified,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_github_empty_commit_list_is_none() {
    let origin = MockOrigin::serve(HashMap::from([(
        "repos/octocat/hello/commits".to_string(),
        MockFile::new("[]"),
    )]))
    .await;

    let config = TestConfigBuilder::new()
        .raw_host(&origin.base_url())
        .api_host(&origin.base_url())
        .build();
    let provider = GitHubFileProvider::new(http_client(), GitHubAuth::anonymous(), &config.github);

    let source = SourceRef::parse("github:octocat@hello/main/src/Program.cs").unwrap();
    assert_eq!(provider.last_modified(&source).await.unwrap(), None);
}

#[tokio::test]
async fn test_pipeline_fetches_rewrites_and_writes() {
    init_test_tracing();
    let origin = MockOrigin::serve(HashMap::from([(
        "vendor/Widget.cs".to_string(),
        MockFile::new("namespace Upstream\n{\n    public class Widget { }\n}\n"),
    )]))
    .await;

    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(HttpFileProvider::new(http_client())));

    let out = tempfile::TempDir::new().unwrap();
    let options = ImportOptions {
        output_path: out.path().to_path_buf(),
        output_prefix: Some("Vendored.".to_string()),
        force_overwrite: false,
        namespace: Some("My.Project".to_string()),
        make_types_internal: true,
    };

    let summary = run_import(
        &[origin.url("vendor/Widget.cs")],
        &options,
        &registry,
        &StdinPrompt,
    )
    .await
    .unwrap();
    assert_eq!(summary.total(), 1);

    let written = tokio::fs::read_to_string(out.path().join("Vendored.Widget.cs"))
        .await
        .unwrap();
    assert_eq!(
        written,
        "namespace My.Project\n{\n    internal class Widget { }\n}\n"
    );
}
