//! GitHub provider implementation.

use anyhow::{Context, Result};
use log::debug;

use super::registry::is_github_url;
use super::types::flatten_body;
use super::{Asset, Author, Owner, Permissions, Provider, ProviderKind, Release, Repository};

/// GitHub API response types (internal).
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
        pub tarball_url: Option<String>,
        pub zipball_url: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub draft: bool,
        #[serde(deserialize_with = "null_as_default")]
        pub prerelease: bool,
        pub created_at: Option<String>,
        pub published_at: Option<String>,
        pub author: Option<User>,
        #[serde(deserialize_with = "null_as_default")]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct User {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub login: String,
        pub avatar_url: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Asset {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub name: String,
        #[serde(deserialize_with = "null_as_default")]
        pub size: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub download_count: i64,
        pub created_at: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub browser_download_url: String,
        pub content_type: Option<String>,
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
        pub stargazers_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub forks_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub watchers_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub open_issues_count: i64,
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

/// GitHub provider implementation.
///
/// Expects the API host (`https://api.github.com`) as base URL; see
/// [`normalize_base_url`](super::normalize_base_url).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitHubProvider;

impl Provider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn releases_url(&self, base_url: &str, user: &str, repo: &str, latest: bool) -> String {
        if latest {
            format!("{}/repos/{}/{}/releases/latest", base_url, user, repo)
        } else {
            format!("{}/repos/{}/{}/releases", base_url, user, repo)
        }
    }

    fn repositories_url(&self, base_url: &str, user: &str) -> String {
        format!("{}/users/{}/repos", base_url, user)
    }

    fn normalize_releases(&self, data: &[u8], latest: bool) -> Result<Vec<Release>> {
        if latest {
            let release: api::Release =
                serde_json::from_slice(data).context("Failed to parse GitHub release JSON")?;
            return Ok(vec![release.into()]);
        }

        let releases: Vec<api::Release> =
            serde_json::from_slice(data).context("Failed to parse GitHub releases JSON")?;
        debug!("Normalizing {} GitHub releases", releases.len());
        Ok(releases.into_iter().map(Release::from).collect())
    }

    fn normalize_repositories(&self, data: &[u8]) -> Result<Vec<Repository>> {
        let repos: Vec<api::Repository> =
            serde_json::from_slice(data).context("Failed to parse GitHub repositories JSON")?;
        debug!("Normalizing {} GitHub repositories", repos.len());
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    fn detect(&self, base_url: &str) -> bool {
        is_github_url(base_url)
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        let author = r.author.unwrap_or_default();
        Release {
            id: r.id,
            tag_name: r.tag_name,
            name: r.name.unwrap_or_default(),
            body: flatten_body(r.body.as_deref().unwrap_or_default()),
            url: r.url,
            html_url: r.html_url,
            tarball_url: r.tarball_url.unwrap_or_default(),
            zipball_url: r.zipball_url.unwrap_or_default(),
            draft: r.draft,
            prerelease: r.prerelease,
            created_at: r.created_at.unwrap_or_default(),
            published_at: r.published_at.unwrap_or_default(),
            author: Author {
                username: author.login.clone(),
                login: author.login,
                ..Default::default()
            },
            assets: r.assets.into_iter().map(Asset::from).collect(),
        }
    }
}

impl From<api::Asset> for Asset {
    fn from(a: api::Asset) -> Self {
        Asset {
            id: a.id,
            name: a.name,
            size: a.size,
            download_count: a.download_count,
            created_at: a.created_at.unwrap_or_default(),
            uuid: String::new(),
            browser_download_url: a.browser_download_url,
            kind: a.content_type.unwrap_or_default(),
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
            stars_count: r.stargazers_count,
            forks_count: r.forks_count,
            watchers_count: r.watchers_count,
            open_issues_count: r.open_issues_count,
            // The repos endpoint carries no release count. 1 only flags
            // that releases exist; it is not a count.
            release_counter: i64::from(r.has_releases),
            default_branch: r.default_branch.unwrap_or_default(),
            archived: r.archived,
            created_at: r.created_at.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
            owner: Owner {
                id: owner.id,
                username: owner.login.clone(),
                login: owner.login,
                avatar_url: owner.avatar_url.unwrap_or_default(),
                ..Default::default()
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
