//! Azure Cosmos DB document store.
//!
//! Talks to the Cosmos DB SQL REST API directly with `reqwest`, signing each
//! request with the account master key.

pub mod auth;
pub mod config;
pub mod error;
pub mod resource;
pub mod store;

pub use config::CosmosConfig;
pub use store::CosmosDocumentStore;
