mod client_secret;
mod endpoints;
mod manager;
mod record;
mod store;

pub use client_secret::OauthClientSecret;
pub use manager::CredentialManager;
pub use record::{CredentialRecord, CredentialState};
pub use store::{CredentialStore, StoreGuard};
