//! Canonical, backend-agnostic release and repository model.
//!
//! Every provider maps its native JSON into these shapes. A field the
//! backend cannot supply is left at its zero value.

use serde::{Deserialize, Deserializer, Serialize};

/// A release, normalized from any provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,
    pub tag_name: String,
    pub name: String,
    /// Release notes with every newline replaced by a space
    pub body: String,
    pub url: String,
    pub html_url: String,
    pub tarball_url: String,
    pub zipball_url: String,
    pub draft: bool,
    pub prerelease: bool,
    /// Provider-native timestamp, kept verbatim
    pub created_at: String,
    /// Provider-native timestamp, kept verbatim
    pub published_at: String,
    pub author: Author,
    pub assets: Vec<Asset>,
}

/// The author of a release.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    pub login_name: String,
    pub full_name: String,
    pub email: String,
    pub username: String,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    /// Size in bytes
    pub size: i64,
    pub download_count: i64,
    pub created_at: String,
    pub uuid: String,
    pub browser_download_url: String,
    /// Content type (GitHub, Gitea) or link type (GitLab)
    #[serde(rename = "type")]
    pub kind: String,
}

/// A repository, normalized from any provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub private: bool,
    pub fork: bool,
    /// Size in kilobytes
    pub size: i64,
    pub language: String,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
    pub stars_count: i64,
    pub forks_count: i64,
    pub watchers_count: i64,
    pub open_issues_count: i64,
    /// Exact for Gitea, 0/1 placeholder for GitHub, always 0 for GitLab.
    pub release_counter: i64,
    pub default_branch: String,
    pub archived: bool,
    pub created_at: String,
    pub updated_at: String,
    pub owner: Owner,
    pub permissions: Permissions,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    pub has_releases: bool,
    pub has_packages: bool,
}

/// Repository owner information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub login: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
}

/// The caller's permissions on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

/// Deserializes an explicit JSON `null` as the type's default.
///
/// Wire structs use this on non-optional fields so `"links": null`
/// behaves like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Replaces every newline in release notes with a space.
pub(crate) fn flatten_body(body: &str) -> String {
    body.replace('\n', " ")
}
