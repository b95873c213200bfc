//! Release and repository fetching.
//!
//! Each call resolves a provider, normalizes the base URL, builds the
//! endpoint, issues exactly one GET through the given [`Transport`] and
//! hands the body to the provider for normalization. Nothing is cached.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::http::Transport;
use crate::provider::{Provider, ProviderKind, Release, Repository, normalize_base_url, resolve};

/// Which releases to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    pub base_url: String,
    pub user: String,
    pub repo: String,
    /// Only the latest release
    pub latest: bool,
    /// Explicit provider (None = detect from `base_url`)
    pub provider: Option<ProviderKind>,
}

impl ReleaseQuery {
    /// Query for all releases of `user/repo`.
    pub fn new(base_url: impl Into<String>, user: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: user.into(),
            repo: repo.into(),
            latest: false,
            provider: None,
        }
    }

    /// Fetch only the latest release.
    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Set the provider explicitly.
    pub fn provider(mut self, kind: ProviderKind) -> Self {
        self.provider = Some(kind);
        self
    }
}

/// Which repositories to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryQuery {
    pub base_url: String,
    pub user: String,
    /// Keep only repositories whose release counter is positive
    pub with_releases: bool,
    /// Explicit provider (None = detect from `base_url`)
    pub provider: Option<ProviderKind>,
}

impl RepositoryQuery {
    /// Query for all repositories of `user`.
    pub fn new(base_url: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: user.into(),
            with_releases: false,
            provider: None,
        }
    }

    /// Keep only repositories with releases.
    pub fn with_releases(mut self, with_releases: bool) -> Self {
        self.with_releases = with_releases;
        self
    }

    /// Set the provider explicitly.
    pub fn provider(mut self, kind: ProviderKind) -> Self {
        self.provider = Some(kind);
        self
    }
}

/// Fetch releases and normalize them into the canonical model.
///
/// With `latest` set the result holds at most one release. GitLab has no
/// latest endpoint, so there the first element of the full list is used.
#[tracing::instrument(skip(transport))]
pub async fn get_releases<T: Transport + ?Sized>(
    transport: &T,
    query: &ReleaseQuery,
) -> Result<Vec<Release>> {
    let provider = resolve(query.provider, &query.base_url);
    let base_url = normalize_base_url(&query.base_url, provider.kind());
    let url = provider.releases_url(&base_url, &query.user, &query.repo, query.latest);

    info!(
        "Fetching {} releases of {}/{} from {}",
        provider.kind(),
        query.user,
        query.repo,
        url
    );
    let data = transport
        .get_bytes(&url)
        .await
        .with_context(|| format!("Failed to fetch releases of {}/{}", query.user, query.repo))?;

    let releases = provider.normalize_releases(&data, query.latest)?;
    debug!("Got {} releases", releases.len());
    Ok(releases)
}

/// Fetch the repositories of a user and normalize them.
#[tracing::instrument(skip(transport))]
pub async fn get_repositories<T: Transport + ?Sized>(
    transport: &T,
    query: &RepositoryQuery,
) -> Result<Vec<Repository>> {
    let provider = resolve(query.provider, &query.base_url);
    let base_url = normalize_base_url(&query.base_url, provider.kind());
    let url = provider.repositories_url(&base_url, &query.user);

    info!(
        "Fetching {} repositories of {} from {}",
        provider.kind(),
        query.user,
        url
    );
    let data = transport
        .get_bytes(&url)
        .await
        .with_context(|| format!("Failed to fetch repositories of {}", query.user))?;

    let repos = provider.normalize_repositories(&data)?;
    debug!("Got {} repositories", repos.len());

    if query.with_releases {
        return Ok(filter_with_releases(repos));
    }
    Ok(repos)
}

/// Keep only repositories whose release counter is positive.
///
/// GitLab never reports a counter, so its repositories are all dropped.
pub fn filter_with_releases(repos: Vec<Repository>) -> Vec<Repository> {
    repos.into_iter().filter(|r| r.release_counter > 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpStatusError, MockTransport};
    use mockall::predicate::eq;

    fn repo(name: &str, release_counter: i64) -> Repository {
        Repository {
            name: name.to_string(),
            release_counter,
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_with_releases() {
        let repos = vec![repo("Repo1", 2), repo("Repo2", 0)];
        let filtered = filter_with_releases(repos);
        assert_eq!(filtered, vec![repo("Repo1", 2)]);
    }

    #[test]
    fn test_query_builders() {
        let query = ReleaseQuery::new("https://gitlab.com", "owner", "repo")
            .latest(true)
            .provider(ProviderKind::GitLab);
        assert!(query.latest);
        assert_eq!(query.provider, Some(ProviderKind::GitLab));

        let query = RepositoryQuery::new("https://gitea.com", "owner").with_releases(true);
        assert!(query.with_releases);
        assert_eq!(query.provider, None);
    }

    #[tokio::test]
    async fn test_get_releases_builds_gitlab_url() {
        let mut transport = MockTransport::new();
        transport
            .expect_get_bytes()
            .with(eq("https://gitlab.com/api/v4/projects/owner%2Frepo/releases"))
            .times(1)
            .returning(|_| Ok(br#"[{"tag_name": "v2"}, {"tag_name": "v1"}]"#.to_vec()));

        let query = ReleaseQuery::new("https://gitlab.com", "owner", "repo").latest(true);
        let releases = get_releases(&transport, &query).await.unwrap();

        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag_name, "v2");
    }

    #[tokio::test]
    async fn test_get_releases_github_host_rewritten() {
        let mut transport = MockTransport::new();
        transport
            .expect_get_bytes()
            .with(eq("https://api.github.com/repos/owner/repo/releases/latest"))
            .times(1)
            .returning(|_| Ok(br#"{"id": 1, "tag_name": "v1.0.0"}"#.to_vec()));

        let query = ReleaseQuery::new("github.com/", "owner", "repo").latest(true);
        let releases = get_releases(&transport, &query).await.unwrap();
        assert_eq!(releases[0].id, 1);
    }

    #[tokio::test]
    async fn test_get_releases_hint_overrides_detection() {
        let mut transport = MockTransport::new();
        transport
            .expect_get_bytes()
            .with(eq("https://gitlab.example.com/api/v1/repos/owner/repo/releases"))
            .times(1)
            .returning(|_| Ok(b"[]".to_vec()));

        let query = ReleaseQuery::new("https://gitlab.example.com", "owner", "repo")
            .provider(ProviderKind::Gitea);
        let releases = get_releases(&transport, &query).await.unwrap();
        assert!(releases.is_empty());
    }

    #[tokio::test]
    async fn test_get_releases_transport_error_propagates() {
        let mut transport = MockTransport::new();
        transport.expect_get_bytes().times(1).returning(|url| {
            Err(HttpStatusError::new(url, reqwest::StatusCode::NOT_FOUND).into())
        });

        let query = ReleaseQuery::new("https://gitea.example.com", "owner", "missing");
        let err = get_releases(&transport, &query).await.unwrap_err();

        assert!(err.to_string().contains("owner/missing"));
        assert_eq!(err.downcast_ref::<HttpStatusError>().unwrap().code(), 404);
    }

    #[tokio::test]
    async fn test_get_releases_parse_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_get_bytes()
            .returning(|_| Ok(b"<html>not json</html>".to_vec()));

        let query = ReleaseQuery::new("https://gitea.example.com", "owner", "repo");
        let err = get_releases(&transport, &query).await.unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }

    #[tokio::test]
    async fn test_get_repositories_with_releases_only() {
        let mut transport = MockTransport::new();
        transport
            .expect_get_bytes()
            .with(eq("https://gitea.example.com/api/v1/users/testuser/repos"))
            .times(1)
            .returning(|_| {
                Ok(br#"[{"id": 1, "name": "Repo1", "release_counter": 2},
                        {"id": 2, "name": "Repo2", "release_counter": 0}]"#
                    .to_vec())
            });

        let query = RepositoryQuery::new("https://gitea.example.com/", "testuser")
            .with_releases(true);
        let repos = get_repositories(&transport, &query).await.unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "Repo1");
        assert_eq!(repos[0].release_counter, 2);
    }

    #[tokio::test]
    async fn test_get_repositories_all() {
        let mut transport = MockTransport::new();
        transport.expect_get_bytes().returning(|_| {
            Ok(br#"[{"id": 1, "name": "Repo1", "release_counter": 2},
                    {"id": 2, "name": "Repo2", "release_counter": 0}]"#
                .to_vec())
        });

        let query = RepositoryQuery::new("https://gitea.example.com", "testuser");
        let repos = get_repositories(&transport, &query).await.unwrap();
        assert_eq!(repos.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_get_releases_over_http() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/v1/repos/owner/repo/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 7, "tag_name": "v1.0.0", "body": "a\nb"}"#)
            .create_async()
            .await;

        let client = HttpClient::with_defaults().unwrap();
        let query = ReleaseQuery::new(server.url(), "owner", "repo")
            .latest(true)
            .provider(ProviderKind::Gitea);
        let releases = get_releases(&client, &query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].body, "a b");
    }

    #[test_log::test(tokio::test)]
    async fn test_get_repositories_server_error() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/v1/users/testuser/repos")
            .with_status(500)
            .create_async()
            .await;

        let client = HttpClient::with_defaults().unwrap();
        let query = RepositoryQuery::new(server.url(), "testuser");
        let result = get_repositories(&client, &query).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }
}
