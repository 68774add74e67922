//! Core types shared by the resorts catalog crates.
//!
//! A logical resort entity is split across two stores: the document body
//! lives in a document store, and each photo lives as a binary in an object
//! store. The types here describe both halves and the link between them.

pub mod attachment;
pub mod document;
pub mod image;
pub mod upload;

pub use attachment::{AttachmentDescriptor, AttachmentRecord};
pub use document::{Document, DocumentLink, ResortDocument, new_document_id};
pub use image::encode_data_url;
pub use upload::{UploadedFile, descriptor_name};
