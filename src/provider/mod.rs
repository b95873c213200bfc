//! Provider abstraction for Git hosting backends.
//!
//! Each backend (Gitea, GitHub, GitLab) builds its own API URLs and maps
//! its own JSON schema into the canonical [`Release`] and [`Repository`]
//! shapes.

mod gitea;
mod github;
mod gitlab;
mod registry;
mod types;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gitea::GiteaProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use registry::{detect, normalize_base_url, resolve};
pub use types::{Asset, Author, Owner, Permissions, Release, Repository};

/// Provider kind identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gitea,
    GitHub,
    GitLab,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gitea => write!(f, "gitea"),
            ProviderKind::GitHub => write!(f, "github"),
            ProviderKind::GitLab => write!(f, "gitlab"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gitea" => Ok(ProviderKind::Gitea),
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            _ => anyhow::bail!(
                "Unknown provider kind: {}. Expected gitea, github, or gitlab.",
                s
            ),
        }
    }
}

/// Operations every Git hosting backend implements.
///
/// URL builders take an already normalized base URL (see
/// [`normalize_base_url`]). Normalizers take the raw response body and
/// fail on malformed JSON without attempting partial decoding.
pub trait Provider {
    /// Get the provider kind.
    fn kind(&self) -> ProviderKind;

    /// API URL listing releases, or the single latest release when `latest` is set.
    fn releases_url(&self, base_url: &str, user: &str, repo: &str, latest: bool) -> String;

    /// API URL listing the repositories of `user`.
    fn repositories_url(&self, base_url: &str, user: &str) -> String;

    /// Map a releases response into canonical releases.
    fn normalize_releases(&self, data: &[u8], latest: bool) -> Result<Vec<Release>>;

    /// Map a repositories response into canonical repositories.
    fn normalize_repositories(&self, data: &[u8]) -> Result<Vec<Repository>>;

    /// Check whether `base_url` points at this backend.
    fn detect(&self, base_url: &str) -> bool;
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeProvider {
    Gitea(GiteaProvider),
    GitHub(GitHubProvider),
    GitLab(GitLabProvider),
}

impl From<ProviderKind> for ForgeProvider {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gitea => ForgeProvider::Gitea(GiteaProvider),
            ProviderKind::GitHub => ForgeProvider::GitHub(GitHubProvider),
            ProviderKind::GitLab => ForgeProvider::GitLab(GitLabProvider),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $call:expr) => {
        match $self {
            ForgeProvider::Gitea($p) => $call,
            ForgeProvider::GitHub($p) => $call,
            ForgeProvider::GitLab($p) => $call,
        }
    };
}

impl Provider for ForgeProvider {
    fn kind(&self) -> ProviderKind {
        dispatch!(self, p => p.kind())
    }

    fn releases_url(&self, base_url: &str, user: &str, repo: &str, latest: bool) -> String {
        dispatch!(self, p => p.releases_url(base_url, user, repo, latest))
    }

    fn repositories_url(&self, base_url: &str, user: &str) -> String {
        dispatch!(self, p => p.repositories_url(base_url, user))
    }

    fn normalize_releases(&self, data: &[u8], latest: bool) -> Result<Vec<Release>> {
        dispatch!(self, p => p.normalize_releases(data, latest))
    }

    fn normalize_repositories(&self, data: &[u8]) -> Result<Vec<Repository>> {
        dispatch!(self, p => p.normalize_repositories(data))
    }

    fn detect(&self, base_url: &str) -> bool {
        dispatch!(self, p => p.detect(base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("gitea".parse::<ProviderKind>().unwrap(), ProviderKind::Gitea);
        assert_eq!("GitHub".parse::<ProviderKind>().unwrap(), ProviderKind::GitHub);
        assert_eq!("GITLAB".parse::<ProviderKind>().unwrap(), ProviderKind::GitLab);
        assert!("gitee".parse::<ProviderKind>().is_err());
        assert!("".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Gitea.to_string(), "gitea");
        assert_eq!(ProviderKind::GitHub.to_string(), "github");
        assert_eq!(ProviderKind::GitLab.to_string(), "gitlab");
    }

    #[test]
    fn test_forge_provider_from_kind() {
        for kind in [ProviderKind::Gitea, ProviderKind::GitHub, ProviderKind::GitLab] {
            assert_eq!(ForgeProvider::from(kind).kind(), kind);
        }
    }

    #[test]
    fn test_forge_provider_delegates_urls() {
        let provider = ForgeProvider::from(ProviderKind::GitHub);
        assert_eq!(
            provider.releases_url("https://api.github.com", "owner", "repo", true),
            "https://api.github.com/repos/owner/repo/releases/latest"
        );
        assert_eq!(
            provider.repositories_url("https://api.github.com", "owner"),
            "https://api.github.com/users/owner/repos"
        );
    }
}
