//! HTTP implementation of the catalog backend contract
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/packages?all=true` | List every package summary |
//! | GET    | `/package/{id}` | Full record for one package |
//! | DELETE | `/package/{id}` | Delete a package |
//! | POST   | `/upload` | Create or update a package from a file |
//! | GET    | `/packages/metadata/additional_identifiers` | Identifier types |

pub mod client;

pub use client::{ApiClient, ClientOptions, DEFAULT_USER_AGENT};
