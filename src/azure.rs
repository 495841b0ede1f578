use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::directory::{Credential, DirectoryService, Endpoint, ProjectRef, RepositoryRecord};
use crate::error::{MirrorError, Result};

const API_VERSION: &str = "7.0";

/// Azure DevOps REST client for one organization
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    value: Vec<T>,
}

#[derive(Debug, Serialize)]
struct CreateRepositoryRequest<'a> {
    name: &'a str,
    project: ProjectId<'a>,
}

#[derive(Debug, Serialize)]
struct ProjectId<'a> {
    id: &'a str,
}

impl AzureDevOpsClient {
    /// Create a client for `endpoint` (e.g. `https://dev.azure.com/contoso`)
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("repomirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MirrorError::transport(&endpoint.base_url, e))?;

        Ok(Self {
            http,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            credential: endpoint.credential.clone(),
        })
    }

    /// Build `{base}/{segments...}?api-version=7.0`, escaping each segment
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            MirrorError::transport(&self.base_url, format!("invalid base URL: {}", e))
        })?;

        url.path_segments_mut()
            .map_err(|_| MirrorError::transport(&self.base_url, "base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, project: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .basic_auth("", Some(self.credential.token()))
            .send()
            .await
            .map_err(|e| MirrorError::transport(&self.base_url, e))?;

        let response = self.check_status(response, project).await?;

        response.json::<T>().await.map_err(|e| {
            MirrorError::transport(&self.base_url, format!("invalid response body: {}", e))
        })
    }

    /// Map HTTP status codes onto mirror errors
    ///
    /// Azure DevOps answers a rejected PAT with 203 and a sign-in page, so
    /// that counts as a rejected credential too.
    async fn check_status(&self, response: Response, project: &str) -> Result<Response> {
        match response.status() {
            status if status == StatusCode::NON_AUTHORITATIVE_INFORMATION => Err(
                MirrorError::transport(&self.base_url, "credential rejected (HTTP 203)"),
            ),
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(MirrorError::ProjectNotFound {
                endpoint: self.base_url.clone(),
                project: project.to_string(),
            }),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(MirrorError::transport(
                    &self.base_url,
                    format!("credential rejected (HTTP {})", status),
                ))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MirrorError::transport(
                    &self.base_url,
                    format!("unexpected HTTP {}: {}", status, body.trim()),
                ))
            }
        }
    }
}

#[async_trait]
impl DirectoryService for AzureDevOpsClient {
    fn endpoint_url(&self) -> String {
        self.base_url.clone()
    }

    async fn resolve_project(&self, project: &str) -> Result<ProjectRef> {
        let url = self.api_url(&["_apis", "projects", project])?;
        let response: ProjectResponse = self.get_json(url, project).await?;

        debug!("Resolved project {} to {}", response.name, response.id);
        Ok(ProjectRef {
            id: response.id,
            name: response.name,
        })
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<RepositoryRecord>> {
        let url = self.api_url(&[project, "_apis", "git", "repositories"])?;
        let response: ListResponse<RepositoryRecord> = self.get_json(url, project).await?;

        info!(
            "Found {} repositories in {} at {}",
            response.value.len(),
            project,
            self.base_url
        );
        Ok(response.value)
    }

    async fn create_repository(
        &self,
        project: &ProjectRef,
        name: &str,
    ) -> Result<RepositoryRecord> {
        let url = self.api_url(&["_apis", "git", "repositories"])?;
        let body = CreateRepositoryRequest {
            name,
            project: ProjectId { id: &project.id },
        };

        debug!("POST {} ({})", url, name);

        let response = self
            .http
            .post(url)
            .basic_auth("", Some(self.credential.token()))
            .json(&body)
            .send()
            .await
            .map_err(|e| MirrorError::transport(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() || status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            let text = response.text().await.unwrap_or_default();
            return Err(MirrorError::RepositoryCreate {
                repository: name.to_string(),
                target: name.to_string(),
                message: format!("HTTP {}: {}", status, text.trim()),
            });
        }

        let record: RepositoryRecord = response.json().await.map_err(|e| {
            MirrorError::transport(&self.base_url, format!("invalid response body: {}", e))
        })?;

        info!("Created repository {} in {}", record.name, project.name);
        Ok(record)
    }
}
