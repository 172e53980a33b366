//! Backend contract

use async_trait::async_trait;

use crate::error::FetchError;
use crate::package::{PackageDetail, PackageSummary};
use crate::upload::{UploadResult, UploadSubmission};

/// Everything the engine needs from the catalog backend
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /packages?all=true`
    async fn list_packages(&self) -> Result<Vec<PackageSummary>, FetchError>;

    /// `GET /package/{identifier}`, first element of `Packages`
    async fn package_detail(&self, identifier: &str) -> Result<PackageDetail, FetchError>;

    /// `DELETE /package/{identifier}`
    async fn delete_package(&self, identifier: &str) -> Result<(), FetchError>;

    /// `POST /upload`. Never fails: transport problems are an outcome.
    async fn upload(&self, submission: &UploadSubmission) -> UploadResult;

    /// `GET /packages/metadata/additional_identifiers`
    async fn identifier_types(&self) -> Result<Vec<String>, FetchError>;
}
