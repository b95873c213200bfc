//! GitLab provider implementation.
//!
//! GitLab's schema lacks several canonical fields: releases carry no
//! numeric id, no draft/prerelease flags, and link assets have no size,
//! download count, creation time or UUID. Those stay at zero values.
//! The projects API carries no release count either.

use anyhow::{Context, Result};
use log::debug;

use super::registry::is_gitlab_url;
use super::types::flatten_body;
use super::{Asset, Author, Owner, Permissions, Provider, ProviderKind, Release, Repository};

/// GitLab access levels.
const ACCESS_GUEST: i64 = 10;
const ACCESS_DEVELOPER: i64 = 30;
const ACCESS_OWNER: i64 = 50;

/// GitLab API response types (internal).
mod api {
    use crate::provider::types::null_as_default;
    use serde::Deserialize;
    use serde::de::IgnoredAny;

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Release {
        #[serde(deserialize_with = "null_as_default")]
        pub tag_name: String,
        pub name: Option<String>,
        pub description: Option<String>,
        pub created_at: Option<String>,
        pub released_at: Option<String>,
        pub author: Option<User>,
        pub tag_path: Option<String>,
        pub assets: Option<Assets>,
        #[serde(rename = "_links")]
        pub links: Option<Links>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct User {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub username: String,
        pub name: Option<String>,
        pub email: Option<String>,
        pub avatar_url: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Assets {
        #[serde(deserialize_with = "null_as_default")]
        pub links: Vec<Link>,
        #[serde(deserialize_with = "null_as_default")]
        pub sources: Vec<Source>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Link {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub name: String,
        #[serde(deserialize_with = "null_as_default")]
        pub url: String,
        pub direct_asset_url: Option<String>,
        pub link_type: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Source {
        #[serde(deserialize_with = "null_as_default")]
        pub format: String,
        #[serde(deserialize_with = "null_as_default")]
        pub url: String,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Links {
        #[serde(rename = "self")]
        pub self_url: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Project {
        #[serde(deserialize_with = "null_as_default")]
        pub id: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub name: String,
        #[serde(deserialize_with = "null_as_default")]
        pub path_with_namespace: String,
        pub description: Option<String>,
        pub visibility: Option<String>,
        pub forked_from_project: Option<IgnoredAny>,
        /// Bytes
        #[serde(deserialize_with = "null_as_default")]
        pub size: i64,
        pub language: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub web_url: String,
        pub ssh_url_to_repo: Option<String>,
        pub http_url_to_repo: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub star_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub forks_count: i64,
        #[serde(deserialize_with = "null_as_default")]
        pub open_issues_count: i64,
        pub default_branch: Option<String>,
        #[serde(deserialize_with = "null_as_default")]
        pub archived: bool,
        pub created_at: Option<String>,
        pub last_activity_at: Option<String>,
        pub owner: Option<User>,
        pub permissions: Option<ProjectPermissions>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct ProjectPermissions {
        pub project_access: Option<Access>,
        pub group_access: Option<Access>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct Access {
        #[serde(deserialize_with = "null_as_default")]
        pub access_level: i64,
    }
}

/// GitLab provider implementation.
///
/// Expects a base URL ending in `/api/v4`; see
/// [`normalize_base_url`](super::normalize_base_url).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitLabProvider;

impl Provider for GitLabProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    /// GitLab has no latest-only endpoint; both cases list all releases
    /// and [`normalize_releases`](Provider::normalize_releases) keeps the first.
    fn releases_url(&self, base_url: &str, user: &str, repo: &str, _latest: bool) -> String {
        format!("{}/projects/{}%2F{}/releases", base_url, user, repo)
    }

    fn repositories_url(&self, base_url: &str, user: &str) -> String {
        format!("{}/users/{}/projects", base_url, user)
    }

    fn normalize_releases(&self, data: &[u8], latest: bool) -> Result<Vec<Release>> {
        let releases: Vec<api::Release> =
            serde_json::from_slice(data).context("Failed to parse GitLab releases JSON")?;
        debug!("Normalizing {} GitLab releases", releases.len());

        if latest {
            return Ok(releases.into_iter().take(1).map(Release::from).collect());
        }
        Ok(releases.into_iter().map(Release::from).collect())
    }

    fn normalize_repositories(&self, data: &[u8]) -> Result<Vec<Repository>> {
        let projects: Vec<api::Project> =
            serde_json::from_slice(data).context("Failed to parse GitLab projects JSON")?;
        debug!("Normalizing {} GitLab projects", projects.len());
        Ok(projects.into_iter().map(Repository::from).collect())
    }

    fn detect(&self, base_url: &str) -> bool {
        is_gitlab_url(base_url)
    }
}

/// Derives a stable, non-negative release id from a tag name with a
/// base-31 polynomial hash over its code points.
pub(crate) fn tag_id(tag_name: &str) -> i64 {
    let id = tag_name
        .chars()
        .fold(0i64, |acc, c| acc.wrapping_mul(31).wrapping_add(i64::from(u32::from(c))));
    if id < 0 {
        id.checked_neg().unwrap_or(i64::MAX)
    } else {
        id
    }
}

/// Effective access level: project-level if set, else group-level.
fn access_level(permissions: &api::ProjectPermissions) -> i64 {
    let project = permissions.project_access.as_ref().map_or(0, |a| a.access_level);
    let group = permissions.group_access.as_ref().map_or(0, |a| a.access_level);
    if project > 0 { project } else { group }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        let author = r.author.unwrap_or_default();
        let assets = r.assets.unwrap_or_default();

        let mut tarball_url = String::new();
        let mut zipball_url = String::new();
        for source in assets.sources {
            match source.format.as_str() {
                "tar.gz" | "tar" => tarball_url = source.url,
                "zip" => zipball_url = source.url,
                _ => {}
            }
        }

        Release {
            id: tag_id(&r.tag_name),
            name: r.name.unwrap_or_default(),
            body: flatten_body(r.description.as_deref().unwrap_or_default()),
            url: r.links.and_then(|l| l.self_url).unwrap_or_default(),
            html_url: r.tag_path.unwrap_or_default(),
            tarball_url,
            zipball_url,
            draft: false,
            prerelease: false,
            created_at: r.created_at.unwrap_or_default(),
            published_at: r.released_at.unwrap_or_default(),
            author: Author {
                login: author.username.clone(),
                username: author.username,
                full_name: author.name.unwrap_or_default(),
                email: author.email.unwrap_or_default(),
                ..Default::default()
            },
            assets: assets.links.into_iter().map(Asset::from).collect(),
            tag_name: r.tag_name,
        }
    }
}

impl From<api::Link> for Asset {
    fn from(l: api::Link) -> Self {
        let browser_download_url = l
            .direct_asset_url
            .filter(|u| !u.is_empty())
            .unwrap_or(l.url);
        Asset {
            id: l.id,
            name: l.name,
            browser_download_url,
            kind: l.link_type.unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl From<api::Project> for Repository {
    fn from(p: api::Project) -> Self {
        let owner = p.owner.unwrap_or_default();
        let level = p.permissions.as_ref().map_or(0, access_level);
        Repository {
            id: p.id,
            name: p.name,
            full_name: p.path_with_namespace,
            description: p.description.unwrap_or_default(),
            private: p.visibility.as_deref() == Some("private"),
            fork: p.forked_from_project.is_some(),
            size: p.size / 1024,
            language: p.language.unwrap_or_default(),
            html_url: p.web_url,
            clone_url: p.http_url_to_repo.unwrap_or_default(),
            ssh_url: p.ssh_url_to_repo.unwrap_or_default(),
            stars_count: p.star_count,
            forks_count: p.forks_count,
            open_issues_count: p.open_issues_count,
            default_branch: p.default_branch.unwrap_or_default(),
            archived: p.archived,
            created_at: p.created_at.unwrap_or_default(),
            updated_at: p.last_activity_at.unwrap_or_default(),
            owner: Owner {
                id: owner.id,
                login: owner.username.clone(),
                username: owner.username,
                full_name: owner.name.unwrap_or_default(),
                avatar_url: owner.avatar_url.unwrap_or_default(),
                ..Default::default()
            },
            permissions: Permissions {
                admin: level >= ACCESS_OWNER,
                push: level >= ACCESS_DEVELOPER,
                pull: level >= ACCESS_GUEST,
            },
            ..Default::default()
        }
    }
}
