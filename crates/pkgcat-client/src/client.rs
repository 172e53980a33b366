use std::time::Duration;

use async_trait::async_trait;
use pkgcat_core::upload::classify_upload_response;
use pkgcat_core::{
    CatalogApi, Error, FetchError, PackageDetail, PackageSummary, Result, UploadResult,
    UploadSubmission,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = concat!("pkgcat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    /// No timeout when `None`
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct PackageList {
    #[serde(default)]
    packages: Option<Vec<PackageSummary>>,
}

#[derive(Deserialize)]
struct DetailEnvelope {
    #[serde(rename = "Packages", default)]
    packages: Option<Vec<PackageDetail>>,
}

/// Catalog backend over HTTP. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            Error::Other(anyhow::anyhow!(
                "Invalid API base URL '{}': {}",
                options.base_url,
                e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Other(anyhow::anyhow!(
                "API base URL cannot carry paths: {}",
                options.base_url
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<Response, FetchError> {
        debug!(endpoint, "sending request");
        let resp = request.send().await.map_err(|e| FetchError::Network {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        ensure_ok(endpoint, resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: Url,
    ) -> std::result::Result<T, FetchError> {
        let resp = self.send(endpoint, self.http.get(url)).await?;
        let body = resp.bytes().await.map_err(|e| FetchError::Network {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    fn upload_form(submission: &UploadSubmission) -> Result<Form> {
        let file = Part::bytes(submission.file.bytes.clone())
            .file_name(submission.file.file_name.clone());
        let mut form = Form::new().part("file", file);
        if let Some(package_id) = &submission.package_id {
            form = form.text("package_id", package_id.clone());
        }
        form = form.text("package_name", submission.package_name.clone());
        if let Some(identifiers) = submission.additional_identifiers_json()? {
            form = form.text("additional_identifiers", identifiers);
        }
        Ok(form)
    }
}

fn ensure_ok(endpoint: &str, resp: Response) -> std::result::Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(FetchError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl CatalogApi for ApiClient {
    async fn list_packages(&self) -> std::result::Result<Vec<PackageSummary>, FetchError> {
        let endpoint = "GET /packages";
        let mut url = self.url(&["packages"]);
        url.query_pairs_mut().append_pair("all", "true");

        let list: PackageList = self.get_json(endpoint, url).await?;
        let packages = list.packages.unwrap_or_default();
        debug!(endpoint, count = packages.len(), "packages listed");
        Ok(packages)
    }

    async fn package_detail(
        &self,
        identifier: &str,
    ) -> std::result::Result<PackageDetail, FetchError> {
        let endpoint = format!("GET /package/{identifier}");
        let url = self.url(&["package", identifier]);

        let envelope: DetailEnvelope = self.get_json(&endpoint, url).await?;
        envelope
            .packages
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Decode {
                endpoint,
                reason: "response contained no packages".to_string(),
            })
    }

    async fn delete_package(&self, identifier: &str) -> std::result::Result<(), FetchError> {
        let endpoint = format!("DELETE /package/{identifier}");
        let url = self.url(&["package", identifier]);
        self.send(&endpoint, self.http.delete(url)).await?;
        Ok(())
    }

    async fn upload(&self, submission: &UploadSubmission) -> UploadResult {
        let endpoint = "POST /upload";
        let form = match Self::upload_form(submission) {
            Ok(form) => form,
            Err(e) => return UploadResult::transport_failure(e.to_string()),
        };
        debug!(
            endpoint,
            file = %submission.file.file_name,
            package_id = submission.package_id.as_deref().unwrap_or(""),
            "uploading package file"
        );

        let resp = match self
            .http
            .post(self.url(&["upload"]))
            .multipart(form)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return UploadResult::transport_failure(e.to_string()),
        };
        let status = resp.status().as_u16();
        match resp.bytes().await {
            Ok(body) => classify_upload_response(status, &body),
            Err(e) => UploadResult::transport_failure(e.to_string()),
        }
    }

    async fn identifier_types(&self) -> std::result::Result<Vec<String>, FetchError> {
        let endpoint = "GET /packages/metadata/additional_identifiers";
        let url = self.url(&["packages", "metadata", "additional_identifiers"]);
        self.get_json(endpoint, url).await
    }
}
