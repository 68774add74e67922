//! Azure Blob Storage backend for the resorts object store.
//!
//! Photos are uploaded as block blobs into a single container that is created
//! on first use with public read access. The blob URL is the durable address
//! stored in attachment records.
//!
//! A connection string with an `AccountKey` (including
//! `UseDevelopmentStorage=true`) signs every request with Shared Key.
//! Otherwise credentials come from [`AzureBaseConfig`]: a service principal
//! when tenant, client and credential are all set, the Azure CLI login
//! otherwise.

pub mod auth;
pub mod blob;
pub mod config;
pub mod connection;
pub mod error;
pub mod shared_key;

pub use auth::{BlobCredential, resolve_blob_credential};
pub use blob::{AzureBlobConfig, AzureBlobStore};
pub use config::{AzureBaseConfig, ServicePrincipal};
pub use connection::ConnectionString;
pub use error::{classify_azure_error, classify_status};
pub use shared_key::SharedKey;
