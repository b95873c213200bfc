//! Gitea provider implementation.

use anyhow::{Context, Result};
use log::debug;

use super::registry::{is_github_url, is_gitlab_url};
use super::types::flatten_body;
use super::{Asset, Author, Owner, Permissions, Provider, ProviderKind, Release, Repository};

/// Gitea API response types (internal).
mod api {
    use crate::provider::types::null_as_default;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Release {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub tag_name: String,
        pub name: Option<String>,
        pub body: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub html_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub tarball_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub zipball_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub draft: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub prerelease: bool,
        pub created_at: Option<String>,
        pub published_at: Option<String>,
        pub author: Option<User>,
        #[serde(deserialize_with = "null_as_default")]
        pub assets: Vec<Attachment>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct User {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub login: String,
        pub login_name: Option<String>,
        pub full_name: Option<String>,
        pub email: Option<String>,
        pub username: Option<String>,
        pub avatar_url: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Attachment {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub name: String,
        #[serde(deserialize_with = "null_as_default")]
        pub size: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub download_count: i64,
        pub created_at: Option<String>,
        pub uuid: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub browser_download_url: String,
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Repository {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub name: String,
        #[serde(deserialize_with = "null_as_default")]
        pub full_name: String,
        pub description: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub private: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub fork: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub size: i64,
        pub language: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub html_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub clone_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub ssh_url: String,
        #[serde(deserialize_with = "null_as_default")]
        pub stars_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub forks_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub watchers_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub open_issues_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub release_counter: i64,
        pub default_branch: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub archived: bool,
        pub created_at: Option<String>,
        pub updated_at: Option<String>,
        pub owner: Option<User>,
        pub permissions: Option<Permissions>,
        #[serde(deserialize_with = "null_as_default")]
        pub has_issues: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub has_wiki: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub has_projects: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub has_releases: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub has_packages: bool,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Permissions {
        #[serde(deserialize_with = "null_as_default")]
        pub admin: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub push: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub pull: bool,
    }
}

/// Gitea provider implementation.
///
/// Gitea is the fallback backend: any base URL that is neither GitHub
/// nor GitLab is treated as a Gitea instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GiteaProvider;

impl Provider for GiteaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gitea
    }

    fn releases_url(&self, base_url: &str, user: &str, repo: &str, latest: bool) -> String {
        let release_type = if latest { "releases/latest" } else { "releases" };
        format!("{}/api/v1/repos/{}/{}/{}", base_url, user, repo, release_type)
    }

    fn repositories_url(&self, base_url: &str, user: &str) -> String {
        format!("{}/api/v1/users/{}/repos", base_url, user)
    }

    fn normalize_releases(&self, data: &[u8], latest: bool) -> Result<Vec<Release>> {
        if latest {
            let release: api::Release =
                serde_json::from_slice(data).context("Failed to parse Gitea release JSON")?;
            return Ok(vec![release.into()]);
        }

        let releases: Vec<api::Release> =
            serde_json::from_slice(data).context("Failed to parse Gitea releases JSON")?;
        debug!("Normalizing {} Gitea releases", releases.len());
        Ok(releases.into_iter().map(Release::from).collect())
    }

    fn normalize_repositories(&self, data: &[u8]) -> Result<Vec<Repository>> {
        let repos: Vec<api::Repository> =
            serde_json::from_slice(data).context("Failed to parse Gitea repositories JSON")?;
        debug!("Normalizing {} Gitea repositories", repos.len());
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    fn detect(&self, base_url: &str) -> bool {
        !is_github_url(base_url) && !is_gitlab_url(base_url)
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            id: r.id,
            tag_name: r.tag_name,
            name: r.name.unwrap_or_default(),
            body: flatten_body(r.body.as_deref().unwrap_or_default()),
            url: r.url,
            html_url: r.html_url,
            tarball_url: r.tarball_url,
            zipball_url: r.zipball_url,
            draft: r.draft,
            prerelease: r.prerelease,
            created_at: r.created_at.unwrap_or_default(),
            published_at: r.published_at.unwrap_or_default(),
            author: r.author.map(Author::from).unwrap_or_default(),
            assets: r.assets.into_iter().map(Asset::from).collect(),
        }
    }
}

impl From<api::User> for Author {
    fn from(u: api::User) -> Self {
        Author {
            login: u.login,
            login_name: u.login_name.unwrap_or_default(),
            full_name: u.full_name.unwrap_or_default(),
            email: u.email.unwrap_or_default(),
            username: u.username.unwrap_or_default(),
        }
    }
}

impl From<api::Attachment> for Asset {
    fn from(a: api::Attachment) -> Self {
        Asset {
            id: a.id,
            name: a.name,
            size: a.size,
            download_count: a.download_count,
            created_at: a.created_at.unwrap_or_default(),
            uuid: a.uuid.unwrap_or_default(),
            browser_download_url: a.browser_download_url,
            kind: a.kind.unwrap_or_default(),
        }
    }
}

impl From<api::Repository> for Repository {
    fn from(r: api::Repository) -> Self {
        let owner = r.owner.unwrap_or_default();
        let permissions = r.permissions.unwrap_or_default();
        Repository {
            id: r.id,
            name: r.name,
            full_name: r.full_name,
            description: r.description.unwrap_or_default(),
            private: r.private,
            fork: r.fork,
            size: r.size,
            language: r.language.unwrap_or_default(),
            html_url: r.html_url,
            clone_url: r.clone_url,
            ssh_url: r.ssh_url,
            stars_count: r.stars_count,
            forks_count: r.forks_count,
            watchers_count: r.watchers_count,
            open_issues_count: r.open_issues_count,
            release_counter: r.release_counter,
            default_branch: r.default_branch.unwrap_or_default(),
            archived: r.archived,
            created_at: r.created_at.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
            owner: Owner {
                id: owner.id,
                login: owner.login,
                username: owner.username.unwrap_or_default(),
                full_name: owner.full_name.unwrap_or_default(),
                email: owner.email.unwrap_or_default(),
                avatar_url: owner.avatar_url.unwrap_or_default(),
            },
            permissions: Permissions {
                admin: permissions.admin,
                push: permissions.push,
                pull: permissions.pull,
            },
            has_issues: r.has_issues,
            has_wiki: r.has_wiki,
            has_projects: r.has_projects,
            has_releases: r.has_releases,
            has_packages: r.has_packages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATEST_RELEASE: &str = r#"{
        "id": 42,
        "tag_name": "v1.2.0",
        "name": "Release 1.2.0",
        "body": "First line\nSecond line",
        "url": "https://gitea.example.com/api/v1/repos/owner/repo/releases/42",
        "html_url": "https://gitea.example.com/owner/repo/releases/tag/v1.2.0",
        "tarball_url": "https://gitea.example.com/owner/repo/archive/v1.2.0.tar.gz",
        "zipball_url": "https://gitea.example.com/owner/repo/archive/v1.2.0.zip",
        "draft": false,
        "prerelease": true,
        "created_at": "2024-03-01T10:00:00+01:00",
        "published_at": "2024-03-01T10:05:00+01:00",
        "author": {
            "id": 7,
            "login": "alice",
            "login_name": "",
            "full_name": "Alice Example",
            "email": "alice@example.com",
            "username": "alice"
        },
        "assets": [{
            "id": 3,
            "name": "tool-linux-amd64",
            "size": 2048,
            "download_count": 17,
            "created_at": "2024-03-01T10:04:00+01:00",
            "uuid": "0b7e6a2c-5d1f-4b0e-9a9c-3f2d2c1b0a99",
            "browser_download_url": "https://gitea.example.com/attachments/0b7e6a2c"
        }]
    }"#;

    #[test]
    fn test_releases_url() {
        let p = GiteaProvider;
        assert_eq!(
            p.releases_url("https://gitea.example.com", "owner", "repo", false),
            "https://gitea.example.com/api/v1/repos/owner/repo/releases"
        );
        assert_eq!(
            p.releases_url("https://gitea.example.com", "owner", "repo", true),
            "https://gitea.example.com/api/v1/repos/owner/repo/releases/latest"
        );
    }

    #[test]
    fn test_repositories_url() {
        assert_eq!(
            GiteaProvider.repositories_url("https://gitea.example.com", "owner"),
            "https://gitea.example.com/api/v1/users/owner/repos"
        );
    }

    #[test]
    fn test_normalize_latest_release() {
        let releases = GiteaProvider
            .normalize_releases(LATEST_RELEASE.as_bytes(), true)
            .unwrap();

        assert_eq!(releases.len(), 1);
        let rel = &releases[0];
        assert_eq!(rel.id, 42);
        assert_eq!(rel.tag_name, "v1.2.0");
        assert_eq!(rel.body, "First line Second line");
        assert!(rel.prerelease);
        assert_eq!(rel.published_at, "2024-03-01T10:05:00+01:00");
        assert_eq!(rel.author.login, "alice");
        assert_eq!(rel.author.full_name, "Alice Example");

        assert_eq!(rel.assets.len(), 1);
        let asset = &rel.assets[0];
        assert_eq!(asset.size, 2048);
        assert_eq!(asset.download_count, 17);
        assert_eq!(asset.uuid, "0b7e6a2c-5d1f-4b0e-9a9c-3f2d2c1b0a99");
    }

    #[test]
    fn test_normalize_release_list() {
        let data = format!("[{}, {}]", LATEST_RELEASE, r#"{"id": 1, "tag_name": "v1.0.0"}"#);
        let releases = GiteaProvider
            .normalize_releases(data.as_bytes(), false)
            .unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[1].tag_name, "v1.0.0");
        assert_eq!(releases[1].body, "");
        assert!(releases[1].assets.is_empty());
    }

    #[test]
    fn test_normalize_release_list_rejects_object() {
        let result = GiteaProvider.normalize_releases(LATEST_RELEASE.as_bytes(), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_releases_malformed() {
        let result = GiteaProvider.normalize_releases(b"{not json", true);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Gitea"));
    }

    #[test]
    fn test_normalize_repositories() {
        let data = r#"[{
            "id": 1,
            "name": "tool",
            "full_name": "owner/tool",
            "description": null,
            "size": 512,
            "stars_count": 5,
            "release_counter": 3,
            "default_branch": "main",
            "owner": {"id": 9, "login": "owner", "username": "owner", "avatar_url": "https://gitea.example.com/avatar/9"},
            "permissions": {"admin": false, "push": true, "pull": true},
            "has_releases": true
        }]"#;

        let repos = GiteaProvider.normalize_repositories(data.as_bytes()).unwrap();
        assert_eq!(repos.len(), 1);
        let repo = &repos[0];
        assert_eq!(repo.full_name, "owner/tool");
        assert_eq!(repo.description, "");
        assert_eq!(repo.size, 512);
        assert_eq!(repo.release_counter, 3);
        assert_eq!(repo.owner.username, "owner");
        assert!(repo.permissions.push);
        assert!(!repo.permissions.admin);
        assert!(repo.has_releases);
    }

    #[test]
    fn test_normalize_null_fields() {
        let data = r#"[{"id": 1, "tag_name": "v1.0.0", "tarball_url": null, "assets": null}]"#;
        let releases = GiteaProvider.normalize_releases(data.as_bytes(), false).unwrap();
        assert_eq!(releases[0].tarball_url, "");
        assert!(releases[0].assets.is_empty());

        let data = r#"[{"id": 1, "name": "x", "release_counter": null, "ssh_url": null}]"#;
        let repos = GiteaProvider.normalize_repositories(data.as_bytes()).unwrap();
        assert_eq!(repos[0].release_counter, 0);
        assert_eq!(repos[0].ssh_url, "");
    }

    #[test]
    fn test_detect() {
        assert!(GiteaProvider.detect("https://gitea.example.com"));
        assert!(GiteaProvider.detect("https://codeberg.org"));
        assert!(!GiteaProvider.detect("https://api.github.com"));
        assert!(!GiteaProvider.detect("https://gitlab.example.com"));
    }
}
