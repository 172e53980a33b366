//! Core domain models and logic for pkgcat
//!
//! This crate contains:
//! - Domain models (PackageSummary, PackageDetail, Title)
//! - Catalog view math (filter, sort, paginate)
//! - Upload form validation and response classification
//! - Request sequencing and the backend contract

pub mod api;
pub mod catalog;
pub mod error;
pub mod package;
pub mod sequence;
pub mod upload;

pub use api::CatalogApi;
pub use catalog::{Page, SortKey, ViewState};
pub use error::{Error, FetchError, Result, ValidationError};
pub use package::{ContentRefs, PackageDetail, PackageSummary, RelatedOrg, Title, TitleLink};
pub use sequence::{RequestSequence, Ticket};
pub use upload::{
    RowIssue, Severity, UploadFile, UploadForm, UploadResult, UploadSubmission, UploadTarget,
};
