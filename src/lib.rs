//! Fetch release and repository metadata from Gitea, GitHub and GitLab
//! through one canonical model, and compare version strings.

pub mod download;
pub mod fetch;
pub mod http;
pub mod provider;
pub mod version;
