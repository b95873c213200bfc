//! Provider resolution and base URL normalization.
//!
//! Detection runs in a fixed order: GitHub, then GitLab, then Gitea as
//! the unconditional fallback.

use log::debug;

use super::{ForgeProvider, GitHubProvider, GitLabProvider, Provider, ProviderKind};

const GITHUB_API_HOST: &str = "api.github.com";
const GITLAB_API_PATH: &str = "/api/v4";

pub(crate) fn is_github_url(base_url: &str) -> bool {
    let url = base_url.to_lowercase();
    url.contains("github.com") || url.contains(GITHUB_API_HOST)
}

pub(crate) fn is_gitlab_url(base_url: &str) -> bool {
    let url = base_url.to_lowercase();
    url.contains("gitlab.com") || url.contains("gitlab")
}

/// Detect the backend behind `base_url`. Never fails; Gitea is the fallback.
pub fn detect(base_url: &str) -> ProviderKind {
    if GitHubProvider.detect(base_url) {
        ProviderKind::GitHub
    } else if GitLabProvider.detect(base_url) {
        ProviderKind::GitLab
    } else {
        ProviderKind::Gitea
    }
}

/// Resolve the provider to use.
///
/// An explicit `hint` wins without any detection; otherwise the kind is
/// detected from `base_url`.
pub fn resolve(hint: Option<ProviderKind>, base_url: &str) -> ForgeProvider {
    let kind = match hint {
        Some(kind) => kind,
        None => {
            let kind = detect(base_url);
            debug!("Detected provider {} for {}", kind, base_url);
            kind
        }
    };
    ForgeProvider::from(kind)
}

/// Bring a user-supplied base URL into the form the provider's URL
/// builders expect.
///
/// - All providers: trailing slashes are trimmed.
/// - GitHub: a bare `github.com` host becomes `api.github.com`, which is
///   always reached over `https://`. Other hosts get `https://` only when
///   no scheme is given.
/// - GitLab: the scheme is forced to `https://` when missing, and
///   `/api/v4` is appended unless already present.
/// - Gitea: passed through otherwise unchanged.
pub fn normalize_base_url(base_url: &str, kind: ProviderKind) -> String {
    let trimmed = base_url.trim_end_matches('/');

    match kind {
        ProviderKind::Gitea => trimmed.to_string(),
        ProviderKind::GitHub => {
            let url = ensure_scheme(trimmed);
            let (scheme, rest) = split_scheme(&url);
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            let public_host = host.eq_ignore_ascii_case("github.com")
                || host.eq_ignore_ascii_case("www.github.com")
                || host.eq_ignore_ascii_case(GITHUB_API_HOST);
            // The public API only speaks https; other hosts keep their scheme.
            let (scheme, host) = if public_host {
                ("https://", GITHUB_API_HOST)
            } else {
                (scheme, host)
            };
            if path.is_empty() {
                format!("{}{}", scheme, host)
            } else {
                format!("{}{}/{}", scheme, host, path)
            }
        }
        ProviderKind::GitLab => {
            let url = ensure_scheme(trimmed);
            if url.contains(GITLAB_API_PATH) {
                url
            } else {
                format!("{}{}", url, GITLAB_API_PATH)
            }
        }
    }
}

fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn split_scheme(url: &str) -> (&str, &str) {
    match url.find("://") {
        Some(pos) => url.split_at(pos + 3),
        None => ("", url),
    }
}
