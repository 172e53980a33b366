//! Client-side state machines for pkgcat
//!
//! Each component owns its own request sequence, so a response that arrives
//! after a newer request was issued is dropped instead of overwriting state.

pub mod catalog_store;
pub mod deletion;
pub mod detail_resolver;
pub mod upload_pipeline;

pub use catalog_store::{CatalogState, CatalogStore, CatalogView};
pub use deletion::{DeletionState, DeletionWorkflow};
pub use detail_resolver::{DetailResolver, DetailState};
pub use upload_pipeline::{IdentifierTypes, UploadCompletion, UploadPipeline, UploadState};
