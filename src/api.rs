// API client module: a small blocking HTTP client for the GitHub REST API.
// Every operation is a single synchronous request (folder upload and
// download issue one request per file, strictly in order).

use crate::config::{Config, DEFAULT_API_URL, DEFAULT_BRANCH};
use crate::walk::walk_files;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accept header pinning the v3 REST API.
pub const API_ACCEPT: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Outcome of a call the server answered. Transport failures are not
/// represented here; they surface as `Err` from the client methods.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Success(T),
    Failure { status: u16, message: String },
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            ApiOutcome::Success(value) => Some(value),
            ApiOutcome::Failure { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Success(value) => ApiOutcome::Success(f(value)),
            ApiOutcome::Failure { status, message } => ApiOutcome::Failure { status, message },
        }
    }
}

/// Request body for `POST /user/repos`.
#[derive(Serialize, Debug)]
pub struct CreateRepoRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub auto_init: bool,
}

/// Request body for `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Serialize, Debug)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// One entry of `GET /users/{username}/repos`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a repository contents listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Result of uploading a single file during a folder upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub relative_path: String,
    pub outcome: ApiOutcome<()>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSummary {
    pub files: Vec<FileUpload>,
}

impl UploadSummary {
    pub fn uploaded(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.uploaded()
    }
}

/// Blocking GitHub client. The header set is built once from the token and
/// attached to every authenticated request.
#[derive(Clone)]
pub struct GitHubApi {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    upload_branch: String,
}

impl GitHubApi {
    /// Create a client for the base URL and upload branch in `config`.
    pub fn new(token: &str, config: &Config) -> Result<Self> {
        Self::build(token, &config.api_base_url, &config.upload_branch)
    }

    /// Create a client against an explicit base URL, uploading to the
    /// default branch.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        Self::build(token, base_url, DEFAULT_BRANCH)
    }

    fn build(token: &str, base_url: &str, upload_branch: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Token contains characters not allowed in an HTTP header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));

        let base_url = if base_url.trim().is_empty() {
            DEFAULT_API_URL
        } else {
            base_url.trim_end_matches('/')
        };
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("{} cannot be used as an API base URL", base_url);
        }

        Ok(GitHubApi {
            client,
            base_url,
            headers,
            upload_branch: upload_branch.to_string(),
        })
    }

    /// Create a repository for the authenticated user. The success payload
    /// is the response body exactly as the server sent it.
    pub fn create_repository(
        &self,
        name: &str,
        description: &str,
        init_readme: bool,
    ) -> Result<ApiOutcome<serde_json::Value>> {
        let url = self.endpoint(["user", "repos"])?;
        let body = CreateRepoRequest {
            name,
            description,
            auto_init: init_readme,
        };
        let res = self
            .client
            .post(url.clone())
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .context("Failed to send create repository request")?;
        tracing::debug!(%url, status = %res.status(), "POST");
        json_outcome(res)
    }

    /// Delete each `owner/name` in order and return the ones the server
    /// confirmed with 204 No Content. Other statuses are dropped.
    pub fn delete_repositories<S: AsRef<str>>(&self, full_names: &[S]) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for full_name in full_names {
            let full_name = full_name.as_ref();
            let url = self.endpoint(std::iter::once("repos").chain(full_name.split('/')))?;
            let res = self
                .client
                .delete(url.clone())
                .headers(self.headers.clone())
                .send()
                .with_context(|| format!("Failed to send delete request for {}", full_name))?;
            tracing::debug!(%url, status = %res.status(), "DELETE");
            if res.status() == StatusCode::NO_CONTENT {
                deleted.push(full_name.to_string());
            }
        }
        Ok(deleted)
    }

    /// Create a single file. Returns `true` only on 201 Created.
    pub fn add_file(&self, owner: &str, repo: &str, path: &str, content: &[u8]) -> Result<bool> {
        let body = PutContentRequest {
            message: "Add new file",
            content: STANDARD.encode(content),
            branch: None,
        };
        let res = self.put_content(owner, repo, path, &body)?;
        Ok(res.status() == StatusCode::CREATED)
    }

    /// Upload every regular file under `folder`, one request per file, with
    /// the file's `/`-separated path relative to `folder` as the remote path.
    ///
    /// Individual failures are reported to `on_file` and recorded in the
    /// summary; the walk continues past them. Nothing is retried or rolled
    /// back.
    pub fn upload_folder<F>(
        &self,
        owner: &str,
        repo: &str,
        folder: &Path,
        mut on_file: F,
    ) -> Result<UploadSummary>
    where
        F: FnMut(&FileUpload),
    {
        let mut summary = UploadSummary::default();
        for file in walk_files(folder)? {
            let bytes = std::fs::read(&file.path)
                .with_context(|| format!("Failed to read {}", file.path.display()))?;
            let message = format!("Upload {}", file.relative_path);
            let body = PutContentRequest {
                message: &message,
                content: STANDARD.encode(&bytes),
                branch: Some(self.upload_branch.as_str()),
            };
            let res = self.put_content(owner, repo, &file.relative_path, &body)?;
            let outcome = status_outcome(res, StatusCode::CREATED);
            if let ApiOutcome::Failure { status, message } = &outcome {
                tracing::warn!(path = %file.relative_path, status, %message, "upload failed");
            }
            let upload = FileUpload {
                relative_path: file.relative_path,
                outcome,
            };
            on_file(&upload);
            summary.files.push(upload);
        }
        Ok(summary)
    }

    /// List a user's public repositories as returned by the server.
    pub fn list_user_repositories(
        &self,
        username: &str,
    ) -> Result<ApiOutcome<Vec<RepositorySummary>>> {
        let url = self.endpoint(["users", username, "repos"])?;
        self.get_json(url)
    }

    /// Fetch the root listing of a repository.
    pub fn view_repository_contents(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ApiOutcome<Vec<ContentEntry>>> {
        let url = self.endpoint(["repos", owner, repo, "contents"])?;
        self.get_json(url)
    }

    /// Download the top-level files of a repository into `local_path`,
    /// creating the directory if needed. Subdirectories are not visited.
    /// Returns the paths written.
    pub fn download_repository_contents(
        &self,
        owner: &str,
        repo: &str,
        local_path: &Path,
    ) -> Result<ApiOutcome<Vec<PathBuf>>> {
        let entries = match self.view_repository_contents(owner, repo)? {
            ApiOutcome::Success(entries) => entries,
            ApiOutcome::Failure { status, message } => {
                return Ok(ApiOutcome::Failure { status, message })
            }
        };

        std::fs::create_dir_all(local_path)
            .with_context(|| format!("Failed to create {}", local_path.display()))?;

        let mut written = Vec::new();
        for entry in entries {
            if entry.kind != ContentKind::File {
                continue;
            }
            let Some(download_url) = entry.download_url.as_deref() else {
                tracing::warn!(name = %entry.name, "file entry has no download URL");
                continue;
            };
            // Only the final component is used; the name comes from the server.
            let Some(file_name) = Path::new(&entry.name).file_name() else {
                tracing::warn!(name = %entry.name, "skipping entry with unusable name");
                continue;
            };

            let res = self
                .client
                .get(download_url)
                .headers(self.headers.clone())
                .send()
                .with_context(|| format!("Failed to download {}", entry.name))?;
            tracing::debug!(url = %download_url, status = %res.status(), "GET");
            if !res.status().is_success() {
                tracing::warn!(name = %entry.name, status = %res.status(), "skipping file");
                continue;
            }
            let bytes = res
                .bytes()
                .with_context(|| format!("Failed to read body of {}", entry.name))?;

            let target = local_path.join(file_name);
            std::fs::write(&target, &bytes)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            written.push(target);
        }
        Ok(ApiOutcome::Success(written))
    }

    fn put_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        body: &PutContentRequest<'_>,
    ) -> Result<Response> {
        let url = self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.split('/')),
        )?;
        let res = self
            .client
            .put(url.clone())
            .headers(self.headers.clone())
            .json(body)
            .send()
            .with_context(|| format!("Failed to send upload request for {}", path))?;
        tracing::debug!(%url, status = %res.status(), "PUT");
        Ok(res)
    }

    /// Append `segments` to the base URL, percent-encoding each one so
    /// characters like `#`, `?` and `%` stay part of the path.
    fn endpoint<'a, I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} cannot be used as an API base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<ApiOutcome<T>> {
        let res = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .send()
            .with_context(|| format!("Failed to send request to {}", url))?;
        tracing::debug!(%url, status = %res.status(), "GET");
        json_outcome(res)
    }
}

/// Decode a 2xx body as `T`; anything else becomes a `Failure`.
fn json_outcome<T: DeserializeOwned>(res: Response) -> Result<ApiOutcome<T>> {
    let status = res.status();
    if status.is_success() {
        let value = res.json::<T>().context("Parsing response json")?;
        return Ok(ApiOutcome::Success(value));
    }
    Ok(failure(status, res))
}

/// `Success(())` when the response has exactly `expected` status.
fn status_outcome(res: Response, expected: StatusCode) -> ApiOutcome<()> {
    let status = res.status();
    if status == expected {
        ApiOutcome::Success(())
    } else {
        failure(status, res)
    }
}

/// Prefer the `message` field of a GitHub error body, else the raw text.
fn failure<T>(status: StatusCode, res: Response) -> ApiOutcome<T> {
    let text = res.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);
    ApiOutcome::Failure {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_serializes_field_names() {
        let body = CreateRepoRequest {
            name: "demo",
            description: "desc",
            auto_init: true,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"name":"demo","description":"desc","auto_init":true}"#
        );
    }

    #[test]
    fn put_request_omits_missing_branch() {
        let body = PutContentRequest {
            message: "Add new file",
            content: STANDARD.encode(b"hello"),
            branch: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"message": "Add new file", "content": "aGVsbG8="})
        );
    }

    #[test]
    fn content_kind_accepts_unknown_types() {
        let entries: Vec<ContentEntry> = serde_json::from_value(json!([
            {"name": "README.md", "path": "README.md", "type": "file", "download_url": "https://x/README.md"},
            {"name": "src", "path": "src", "type": "dir", "download_url": null},
            {"name": "weird", "type": "something-new"}
        ]))
        .unwrap();
        assert_eq!(entries[0].kind, ContentKind::File);
        assert_eq!(entries[1].kind, ContentKind::Dir);
        assert_eq!(entries[1].download_url, None);
        assert_eq!(entries[2].kind, ContentKind::Other);
    }

    #[test]
    fn outcome_map_keeps_failure() {
        let failure: ApiOutcome<u32> = ApiOutcome::Failure {
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(
            failure.map(|n| n + 1),
            ApiOutcome::Failure {
                status: 404,
                message: "Not Found".into()
            }
        );
        assert_eq!(ApiOutcome::Success(1).map(|n| n + 1).success(), Some(2));
    }

    #[test]
    fn upload_summary_counts() {
        let summary = UploadSummary {
            files: vec![
                FileUpload {
                    relative_path: "a".into(),
                    outcome: ApiOutcome::Success(()),
                },
                FileUpload {
                    relative_path: "b".into(),
                    outcome: ApiOutcome::Failure {
                        status: 422,
                        message: "sha wasn't supplied".into(),
                    },
                },
            ],
        };
        assert_eq!(summary.uploaded(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn endpoint_encodes_each_segment_under_base_path() {
        let api = GitHubApi::with_base_url("t", "http://localhost:8080/api/v3/").unwrap();
        let url = api
            .endpoint(["repos", "octocat", "demo", "contents", "notes#1.md"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v3/repos/octocat/demo/contents/notes%231.md"
        );

        let url = api.endpoint(["users", "why?", "100%"]).unwrap();
        assert_eq!(url.path(), "/api/v3/users/why%3F/100%25");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        assert!(GitHubApi::with_base_url("t", "not a url").is_err());
        assert!(GitHubApi::with_base_url("t", "mailto:someone@example.com").is_err());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(GitHubApi::with_base_url("bad\ntoken", "http://localhost").is_err());
    }
}
