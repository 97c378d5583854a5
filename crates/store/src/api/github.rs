//! GitHub contents API over HTTP
//!
//! Centralizes request construction, headers and status handling for the
//! `/repos/{owner}/{repo}/contents/{path}` and `/user` endpoints.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{AuthenticatedUser, Contents, ContentsApi, DeleteContents, PutContents};
use crate::config::ProviderConfig;
use crate::credentials::RepoCoordinates;
use crate::entry::{EntryKind, RepositoryEntry};
use crate::error::{Result, StoreError};

pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct ContentDto {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl ContentDto {
    fn into_entry(self) -> (RepositoryEntry, Option<String>) {
        let entry = RepositoryEntry {
            path: self.path,
            name: self.name,
            kind: EntryKind::from_api(&self.kind),
            sha: self.sha,
            size: self.size,
            download_url: self.download_url,
            content: None,
        };
        (entry, self.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsDto {
    Directory(Vec<ContentDto>),
    File(ContentDto),
}

#[derive(Debug, Deserialize)]
struct PutResponseDto {
    content: ContentDto,
}

#[derive(Debug, Deserialize)]
struct ErrorDto {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubContentsApi {
    client: Client,
    api_url: Url,
    raw_url: String,
}

impl GitHubContentsApi {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| StoreError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &ProviderConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url).map_err(|e| {
            StoreError::Configuration(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;
        Ok(Self {
            client,
            api_url,
            raw_url: config.raw_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                StoreError::Configuration(format!("API URL cannot be a base: {}", self.api_url))
            })?;
            path.pop_if_empty();
            for segment in segments {
                for part in segment.split('/').filter(|p| !p.is_empty()) {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }

    fn contents_url(&self, repo: &RepoCoordinates, path: &str) -> Result<Url> {
        if !repo.is_complete() {
            return Err(StoreError::MissingRepository);
        }
        self.endpoint(&["repos", &repo.owner, &repo.name, "contents", path])
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER);
        match token.filter(|t| !t.is_empty()) {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("token {}", token)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            StoreError::Transport(format!("Request for '{}' failed: {}", path, e))
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status, &body, path))
    }
}

/// Translate a provider error response into the domain taxonomy.
///
/// The provider's `message` field is preferred as the human-readable text.
pub(crate) fn error_from_status(status: StatusCode, body: &str, path: &str) -> StoreError {
    let message = serde_json::from_str::<ErrorDto>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!(
                "GitHub API Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )
        });

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(format!("{} ({})", path, message)),
        // Rate limiting is reported as 403 (or 429) and says nothing about the token.
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            if message.to_lowercase().contains("rate limit") =>
        {
            StoreError::Transport(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AuthFailure(message),
        StatusCode::CONFLICT => StoreError::conflict(path, message),
        StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("sha") => {
            StoreError::conflict(path, message)
        }
        StatusCode::UNPROCESSABLE_ENTITY => StoreError::Validation(message),
        _ => StoreError::Transport(message),
    }
}

#[async_trait]
impl ContentsApi for GitHubContentsApi {
    async fn current_user(&self, token: Option<&str>) -> Result<AuthenticatedUser> {
        let url = self.endpoint(&["user"])?;
        debug!("Fetching authenticated user from GitHub API: {}", url);

        let response = self
            .send(self.request(Method::GET, url, token), "/user")
            .await?;
        response.json().await.map_err(|e| {
            StoreError::Transport(format!("Failed to parse GitHub user response: {}", e))
        })
    }

    async fn get_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
    ) -> Result<Contents> {
        let url = self.contents_url(repo, path)?;
        debug!("Fetching GitHub contents: {}", url);

        let response = self
            .send(self.request(Method::GET, url, token), path)
            .await?;
        let dto: ContentsDto = response.json().await.map_err(|e| {
            StoreError::Transport(format!(
                "Failed to parse GitHub API response for {} in {}: {}",
                path, repo, e
            ))
        })?;

        Ok(match dto {
            ContentsDto::Directory(items) => Contents::Directory(
                items
                    .into_iter()
                    .map(|item| item.into_entry().0)
                    .collect(),
            ),
            ContentsDto::File(item) => {
                let (entry, content) = item.into_entry();
                Contents::File {
                    entry,
                    encoded_content: content.unwrap_or_default(),
                }
            }
        })
    }

    async fn put_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &PutContents,
    ) -> Result<RepositoryEntry> {
        let url = self.contents_url(repo, path)?;
        debug!(
            "Writing GitHub contents: {} (update: {})",
            url,
            request.sha.is_some()
        );

        let response = self
            .send(self.request(Method::PUT, url, token).json(request), path)
            .await?;
        let dto: PutResponseDto = response.json().await.map_err(|e| {
            StoreError::Transport(format!(
                "Failed to parse GitHub write response for {} in {}: {}",
                path, repo, e
            ))
        })?;

        info!("Committed '{}' to {}: {}", path, repo, request.message);
        Ok(dto.content.into_entry().0)
    }

    async fn delete_contents(
        &self,
        repo: &RepoCoordinates,
        token: Option<&str>,
        path: &str,
        request: &DeleteContents,
    ) -> Result<()> {
        let url = self.contents_url(repo, path)?;
        debug!("Deleting GitHub contents: {}", url);

        self.send(self.request(Method::DELETE, url, token).json(request), path)
            .await?;

        info!("Deleted '{}' from {}: {}", path, repo, request.message);
        Ok(())
    }

    fn raw_url(&self, repo: &RepoCoordinates, branch: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_url,
            repo.owner,
            repo.name,
            branch,
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> GitHubContentsApi {
        GitHubContentsApi::new(&ProviderConfig::default()).unwrap()
    }

    #[test]
    fn test_contents_url_construction() {
        let repo = RepoCoordinates::new("owner", "repo");
        assert_eq!(
            api().contents_url(&repo, "content/quotes").unwrap().as_str(),
            "https://api.github.com/repos/owner/repo/contents/content/quotes"
        );
        assert_eq!(
            api()
                .contents_url(&repo, "/img/photos/1-my cake.jpg")
                .unwrap()
                .as_str(),
            "https://api.github.com/repos/owner/repo/contents/img/photos/1-my%20cake.jpg"
        );
    }

    #[test]
    fn test_missing_coordinates_are_rejected() {
        let repo = RepoCoordinates::new("", "repo");
        assert!(matches!(
            api().contents_url(&repo, "content/blogs"),
            Err(StoreError::MissingRepository)
        ));
    }

    #[test]
    fn test_api_url_with_path_prefix() {
        let config = ProviderConfig {
            api_url: "https://git.example.com/api/v3/".to_string(),
            ..ProviderConfig::default()
        };
        let api = GitHubContentsApi::new(&config).unwrap();
        assert_eq!(
            api.endpoint(&["user"]).unwrap().as_str(),
            "https://git.example.com/api/v3/user"
        );
    }

    #[test]
    fn test_raw_url() {
        let repo = RepoCoordinates::new("owner", "repo");
        assert_eq!(
            api().raw_url(&repo, "main", "/img/photos/cake.jpg"),
            "https://raw.githubusercontent.com/owner/repo/main/img/photos/cake.jpg"
        );
    }

    #[test]
    fn test_error_mapping_prefers_provider_message() {
        let err = error_from_status(
            StatusCode::CONFLICT,
            r#"{"message":"is at 1234 but expected 5678"}"#,
            "content/blogs/a.md",
        );
        assert!(err.is_conflict());
        assert!(err.to_string().contains("is at 1234 but expected 5678"));

        let err = error_from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#,
            "content/blogs/a.md",
        );
        assert!(err.is_conflict());

        let err = error_from_status(StatusCode::UNAUTHORIZED, r#"{"message":"Bad credentials"}"#, "/user");
        assert!(matches!(err, StoreError::AuthFailure(ref m) if m == "Bad credentials"));

        let err = error_from_status(StatusCode::NOT_FOUND, "", "content/videos");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rate_limit_is_not_an_auth_failure() {
        let err = error_from_status(
            StatusCode::FORBIDDEN,
            r#"{"message":"API rate limit exceeded for 203.0.113.7."}"#,
            "content/blogs",
        );
        assert!(matches!(err, StoreError::Transport(ref m) if m.contains("rate limit")));

        let err = error_from_status(
            StatusCode::FORBIDDEN,
            r#"{"message":"Resource not accessible by personal access token"}"#,
            "content/blogs/a.md",
        );
        assert!(matches!(err, StoreError::AuthFailure(_)));
    }

    #[test]
    fn test_error_mapping_without_body() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>", "content/blogs");
        match err {
            StoreError::Transport(message) => {
                assert_eq!(message, "GitHub API Error: 502 Bad Gateway")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_contents_dto_shapes() {
        let listing: ContentsDto = serde_json::from_str(
            r#"[{"name":"a.md","path":"content/blogs/a.md","sha":"1","size":3,"type":"file","download_url":"https://raw/a.md"},
                {"name":"drafts","path":"content/blogs/drafts","sha":"2","type":"dir","download_url":null}]"#,
        )
        .unwrap();
        assert!(matches!(listing, ContentsDto::Directory(ref items) if items.len() == 2));

        let file: ContentsDto = serde_json::from_str(
            r#"{"name":"a.md","path":"content/blogs/a.md","sha":"1","size":3,"type":"file","content":"SGk=\n","encoding":"base64"}"#,
        )
        .unwrap();
        match file {
            ContentsDto::File(dto) => {
                let (entry, content) = dto.into_entry();
                assert_eq!(entry.kind, EntryKind::File);
                assert_eq!(content.as_deref(), Some("SGk=\n"));
            }
            ContentsDto::Directory(_) => panic!("expected a file"),
        }
    }
}
