use anyhow::Result;
use clap::Parser;
use gitrelease::fetch::{ReleaseQuery, RepositoryQuery, get_releases, get_repositories};
use gitrelease::http::{HttpClient, HttpConfig};
use gitrelease::provider::{ProviderKind, Release, Repository};
use gitrelease::version::{self, Resolution, VersionMessages, VersionOptions};
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

/// gitrelease - release and repository metadata from Gitea, GitHub and GitLab
///
/// The provider is detected from the base URL unless --provider is given.
/// If GITRELEASE_TOKEN is set it is sent as a bearer token.
///
/// Examples:
///   gitrelease releases earentir gitearelease --base-url https://gitea.com --latest
///   gitrelease repos octocat --base-url https://github.com --with-releases
///   gitrelease compare 1.0.0 v1.0.1 --upgrade-url https://example.com/upgrade
#[derive(Parser, Debug)]
#[command(author, version = env!("GITRELEASE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend to use: gitea, github or gitlab (detected from the base URL if unset)
    #[arg(long, env = "GITRELEASE_PROVIDER", value_name = "KIND", global = true)]
    provider: Option<String>,

    /// Request timeout in seconds (0 = default of 15)
    #[arg(
        long,
        env = "GITRELEASE_TIMEOUT",
        value_name = "SECONDS",
        default_value_t = 15,
        global = true
    )]
    timeout: u64,

    /// Bearer token sent with every request
    #[arg(long, env = "GITRELEASE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the releases of a repository
    Releases(ReleasesArgs),

    /// List the repositories of a user
    Repos(ReposArgs),

    /// Compare a version against another and print the verdict message
    Compare(CompareArgs),

    /// Download a file into a directory
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug)]
struct ReleasesArgs {
    /// Repository owner
    user: String,

    /// Repository name
    repo: String,

    /// Base URL of the hosting instance
    #[arg(long, env = "GITRELEASE_BASE_URL", value_name = "URL")]
    base_url: String,

    /// Only the latest release
    #[arg(long)]
    latest: bool,
}

#[derive(clap::Args, Debug)]
struct ReposArgs {
    /// User or organization
    user: String,

    /// Base URL of the hosting instance
    #[arg(long, env = "GITRELEASE_BASE_URL", value_name = "URL")]
    base_url: String,

    /// Only repositories that have releases
    #[arg(long)]
    with_releases: bool,
}

#[derive(clap::Args, Debug)]
struct CompareArgs {
    /// The running version
    own: String,

    /// The version to compare against (usually the latest release tag)
    other: String,

    /// Message when OWN is older
    #[arg(long, value_name = "MSG")]
    older: Option<String>,

    /// Message when both are equal
    #[arg(long, value_name = "MSG")]
    equal: Option<String>,

    /// Message when OWN is newer
    #[arg(long, value_name = "MSG")]
    newer: Option<String>,

    /// Where to upgrade; appended to the default "older" message
    #[arg(long, value_name = "URL")]
    upgrade_url: Option<String>,

    /// Exit with status 125 when OWN is older
    #[arg(long)]
    die_if_older: bool,

    /// Exit with status 125 when OWN is newer
    #[arg(long)]
    die_if_newer: bool,

    /// Print a message when both versions are equal
    #[arg(long)]
    show_on_current: bool,
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    /// URL to download
    url: String,

    /// Target directory
    dir: PathBuf,

    /// Target file name
    filename: String,
}

/// Parse a provider hint. Unknown values fall back to detection.
fn provider_hint(hint: Option<&str>) -> Option<ProviderKind> {
    let hint = hint.filter(|h| !h.is_empty())?;
    match hint.parse() {
        Ok(kind) => Some(kind),
        Err(e) => {
            warn!("{}; detecting the provider from the base URL instead", e);
            None
        }
    }
}

fn http_client(cli: &Cli) -> Result<HttpClient> {
    let mut config = HttpConfig::default().with_timeout(Duration::from_secs(cli.timeout));
    if let Some(token) = cli.token.as_deref().filter(|t| !t.is_empty()) {
        config = config.with_token(token);
    }
    HttpClient::new(config)
}

fn print_releases(releases: &[Release]) {
    if releases.is_empty() {
        println!("No releases found.");
        return;
    }
    for rel in releases {
        println!("{}  {}  (published {})", rel.tag_name, rel.name, rel.published_at);
        for asset in &rel.assets {
            println!("  * {} ({} bytes) {}", asset.name, asset.size, asset.browser_download_url);
        }
    }
}

fn print_repositories(repos: &[Repository]) {
    if repos.is_empty() {
        println!("No repositories found.");
        return;
    }
    for repo in repos {
        println!("{}  ({})  releases: {}", repo.name, repo.full_name, repo.release_counter);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let hint = provider_hint(cli.provider.as_deref());

    match &cli.command {
        Commands::Releases(args) => {
            let client = http_client(&cli)?;
            let mut query =
                ReleaseQuery::new(&args.base_url, &args.user, &args.repo).latest(args.latest);
            query.provider = hint;
            let releases = get_releases(&client, &query).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&releases)?);
            } else {
                print_releases(&releases);
            }
        }
        Commands::Repos(args) => {
            let client = http_client(&cli)?;
            let mut query =
                RepositoryQuery::new(&args.base_url, &args.user).with_releases(args.with_releases);
            query.provider = hint;
            let repos = get_repositories(&client, &query).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&repos)?);
            } else {
                print_repositories(&repos);
            }
        }
        Commands::Compare(args) => {
            let messages = VersionMessages {
                older: args.older.clone(),
                equal: args.equal.clone(),
                newer: args.newer.clone(),
                upgrade_url: args.upgrade_url.clone(),
            };
            let options = VersionOptions {
                die_if_older: args.die_if_older,
                die_if_newer: args.die_if_newer,
                show_message_on_current: args.show_on_current,
            };
            let resolution = version::check(&args.own, &args.other, &messages, &options);
            if !resolution.message().is_empty() {
                println!("{}", resolution.message());
            }
            if resolution.is_halt() {
                std::process::exit(Resolution::EXIT_CODE);
            }
        }
        Commands::Download(args) => {
            let client = http_client(&cli)?;
            let path =
                gitrelease::download::download_binary(&client, &args.url, &args.dir, &args.filename)
                    .await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_releases_parsing() {
        let cli = Cli::try_parse_from([
            "gitrelease",
            "releases",
            "owner",
            "repo",
            "--base-url",
            "https://gitea.com",
            "--latest",
        ])
        .unwrap();
        match cli.command {
            Commands::Releases(args) => {
                assert_eq!(args.user, "owner");
                assert_eq!(args.repo, "repo");
                assert_eq!(args.base_url, "https://gitea.com");
                assert!(args.latest);
            }
            _ => panic!("Expected Releases command"),
        }
        assert_eq!(cli.timeout, 15);
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "gitrelease",
            "--provider",
            "gitlab",
            "--timeout",
            "30",
            "repos",
            "owner",
            "--base-url",
            "https://code.example.com",
            "--with-releases",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("gitlab"));
        assert_eq!(cli.timeout, 30);
        match cli.command {
            Commands::Repos(args) => assert!(args.with_releases),
            _ => panic!("Expected Repos command"),
        }
    }

    #[test]
    fn test_cli_compare_parsing() {
        let cli = Cli::try_parse_from([
            "gitrelease",
            "compare",
            "1.0.0",
            "1.0.1",
            "--upgrade-url",
            "https://example.com/upgrade",
            "--die-if-older",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.own, "1.0.0");
                assert_eq!(args.other, "1.0.1");
                assert_eq!(args.upgrade_url.as_deref(), Some("https://example.com/upgrade"));
                assert!(args.die_if_older);
                assert!(!args.die_if_newer);
                assert!(!args.show_on_current);
            }
            _ => panic!("Expected Compare command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["gitrelease", "owner/repo"]).is_err());
    }

    #[test]
    fn test_provider_hint() {
        assert_eq!(provider_hint(Some("GitHub")), Some(ProviderKind::GitHub));
        assert_eq!(provider_hint(Some("gitee")), None);
        assert_eq!(provider_hint(Some("")), None);
        assert_eq!(provider_hint(None), None);
    }
}
