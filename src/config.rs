// Runtime configuration, read once at startup from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const TOKEN_FILE_NAME: &str = ".ghrepo_token.json";

/// Settings shared by the token store and the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base_url: String,
    /// Location of the persisted token record.
    pub token_file: PathBuf,
    /// Branch that folder uploads commit to.
    pub upload_branch: String,
}

impl Config {
    /// Build a config from `GITHUB_API_URL`, `GHREPO_TOKEN_FILE` and
    /// `GHREPO_BRANCH`, falling back to the defaults for unset variables.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("GITHUB_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let token_file = std::env::var_os("GHREPO_TOKEN_FILE")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);

        let upload_branch = std::env::var("GHREPO_BRANCH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.into());

        Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token_file,
            upload_branch,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.into(),
            token_file: default_token_file(),
            upload_branch: DEFAULT_BRANCH.into(),
        }
    }
}

/// Token record in the user's home directory, or `./.token.json` when no
/// home directory can be determined.
fn default_token_file() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(TOKEN_FILE_NAME),
        None => PathBuf::from(".token.json"),
    }
}
