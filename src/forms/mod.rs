mod client;
mod creator;
pub mod request_builder;

pub use client::{FormsClient, FormsClientFactory};
pub use creator::{FormCreationResult, FormCreator};
pub use request_builder::{build_item_request, build_requests, schema_from_json, validate_schema};
