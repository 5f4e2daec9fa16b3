use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::content_backend::{
    encode_path, ContentBackend, DeleteRequest, PutRequest, RemoteError, RemoteTarget,
    RepositoryInfo, Result, Revision, WireFile,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github.v3+json";

/// A `ContentBackend` speaking the GitHub Contents API.
pub struct GithubBackend {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Metadata-only view of a contents response; `content` may be absent or
/// empty for large files.
#[derive(Deserialize)]
struct RevisionResponse {
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Deserialize)]
struct PutResponseContent {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

impl GithubBackend {
    /// Create a backend for the given API base URL.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| RemoteError::Transport {
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn contents_url(&self, target: &RemoteTarget, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            target.owner,
            target.repo,
            encode_path(path)
        )
    }

    fn repository_url(&self, target: &RemoteTarget) -> String {
        format!("{}/repos/{}/{}", self.base_url, target.owner, target.repo)
    }

    fn authorized(&self, builder: RequestBuilder, target: &RemoteTarget) -> RequestBuilder {
        builder
            .header("Authorization", format!("token {}", target.credential))
            .header("Accept", ACCEPT)
    }

    /// GET the contents endpoint. `Ok(None)` on 404; other failures are typed.
    async fn get_contents(&self, target: &RemoteTarget, path: &str) -> Result<Option<Response>> {
        let response = self
            .authorized(self.client.get(self.contents_url(target, path)), target)
            .query(&[("ref", target.branch.as_str())])
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::OK => Ok(Some(response)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(status_error(response, path).await),
        }
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

/// Turn a non-success response into a typed error, using the API's message when present.
async fn status_error(response: Response, path: &str) -> RemoteError {
    let status = response.status();
    let message = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());
    RemoteError::from_status(status.as_u16(), path, message)
}

#[async_trait]
impl ContentBackend for GithubBackend {
    async fn get_file(&self, target: &RemoteTarget, path: &str) -> Result<Option<WireFile>> {
        tracing::debug!(path, branch = %target.branch, "GET contents");
        let Some(response) = self.get_contents(target, path).await? else {
            return Ok(None);
        };

        let body: ContentsResponse =
            response
                .json()
                .await
                .map_err(|e| RemoteError::InvalidContent {
                    path: path.to_string(),
                    message: format!("failed to parse contents response: {}", e),
                })?;
        // Files above the API's inline limit come back with encoding "none".
        match (body.content, body.encoding.as_deref()) {
            (Some(content), None | Some("base64")) => Ok(Some(WireFile {
                path: body.path,
                content,
                revision: body.sha,
            })),
            (_, encoding) => Err(RemoteError::InvalidContent {
                path: path.to_string(),
                message: format!("unsupported content encoding {:?}", encoding),
            }),
        }
    }

    async fn get_revision(&self, target: &RemoteTarget, path: &str) -> Result<Option<Revision>> {
        tracing::debug!(path, branch = %target.branch, "GET contents revision");
        let Some(response) = self.get_contents(target, path).await? else {
            return Ok(None);
        };

        let body: RevisionResponse =
            response
                .json()
                .await
                .map_err(|e| RemoteError::InvalidContent {
                    path: path.to_string(),
                    message: format!("failed to parse contents response: {}", e),
                })?;
        Ok(Some(body.sha))
    }

    async fn put_file(
        &self,
        target: &RemoteTarget,
        path: &str,
        req: &PutRequest,
    ) -> Result<WireFile> {
        tracing::debug!(
            path,
            bytes = req.content.len(),
            has_sha = req.sha.is_some(),
            "PUT contents"
        );
        let response = self
            .authorized(self.client.put(self.contents_url(target, path)), target)
            .json(req)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            let body: PutResponse =
                response
                    .json()
                    .await
                    .map_err(|e| RemoteError::InvalidContent {
                        path: path.to_string(),
                        message: format!("failed to parse write response: {}", e),
                    })?;
            Ok(WireFile {
                path: body.content.path,
                content: req.content.clone(),
                revision: body.content.sha,
            })
        } else {
            Err(status_error(response, path).await)
        }
    }

    async fn delete_file(
        &self,
        target: &RemoteTarget,
        path: &str,
        req: &DeleteRequest,
    ) -> Result<()> {
        tracing::debug!(path, "DELETE contents");
        let response = self
            .authorized(self.client.delete(self.contents_url(target, path)), target)
            .json(req)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response, path).await)
        }
    }

    async fn repository_info(&self, target: &RemoteTarget) -> Result<RepositoryInfo> {
        let response = self
            .authorized(self.client.get(self.repository_url(target)), target)
            .send()
            .await
            .map_err(transport)?;

        let path = format!("{}/{}", target.owner, target.repo);
        match response.status() {
            StatusCode::OK => response
                .json::<RepositoryInfo>()
                .await
                .map_err(|e| RemoteError::InvalidContent {
                    path,
                    message: format!("failed to parse repository info: {}", e),
                }),
            _ => Err(status_error(response, &path).await),
        }
    }
}
