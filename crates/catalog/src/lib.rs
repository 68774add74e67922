//! Entity-level operations over a document store and an object store.
//!
//! A resort is one document plus any number of photos. The document body is
//! written to a [`DocumentStore`](resorts_document::DocumentStore); each photo
//! is uploaded to an [`ObjectStore`](resorts_blob::ObjectStore) and linked from
//! the document's attachment feed by address.

pub mod catalog;
pub mod config;
pub mod images;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use images::{ImageFailure, ImageSet, Ingested, WithImages};
