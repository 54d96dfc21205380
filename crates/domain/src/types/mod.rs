//! Domain types and models

pub mod auth;
pub mod classify;
pub mod http;
pub mod jobs;
pub mod models;

pub use auth::{Credential, Token};
pub use classify::{ClassifyRequest, ContentSource, ContentType};
pub use http::{ApiVersion, HttpMethod, HttpRequest, HttpResponse, RequestBody, RequestDescriptor};
pub use jobs::{JobAction, JobProfile, JobSpec};
pub use models::{Model, ModelCatalog};
