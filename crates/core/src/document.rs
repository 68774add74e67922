use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Location of a stored document and its attachment feed.
///
/// The `self_link` is assigned by the document store when it accepts a
/// create; the `id` is carried alongside because stores that partition by
/// id need it to address the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    /// Document identifier.
    pub id: String,
    /// Store-assigned self link (e.g. `dbs/a==/colls/b==/docs/c==/`).
    pub self_link: String,
}

impl DocumentLink {
    /// Create a new link from an identifier and a self link.
    pub fn new(id: impl Into<String>, self_link: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            self_link: self_link.into(),
        }
    }

    /// The self link without surrounding slashes.
    pub fn trimmed(&self) -> &str {
        self.self_link.trim_matches('/')
    }
}

/// A document shape that can be persisted by a document store.
///
/// Bodies are serialized with `serde`; the self link and any resolved image
/// payloads are transient and must not be part of the serialized body.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The document identifier.
    fn id(&self) -> &str;

    /// Replace the document identifier.
    fn set_id(&mut self, id: String);

    /// The store-assigned self link, if the document has been persisted.
    fn self_link(&self) -> Option<&str>;

    /// Record the store-assigned self link.
    fn set_self_link(&mut self, self_link: String);

    /// Attach resolved image data URLs, in attachment feed order.
    fn set_images(&mut self, images: Vec<String>);

    /// Build a [`DocumentLink`] for this document, if it has a self link.
    fn link(&self) -> Option<DocumentLink> {
        self.self_link()
            .map(|self_link| DocumentLink::new(self.id(), self_link))
    }
}

/// Generate a fresh, globally unique document identifier.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A resort catalog entry.
///
/// Persisted as `{ "id", "resortName", "resortDescription" }`. The store adds
/// `_self`, which is read back into [`ResortDocument::self_link`] but never
/// written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResortDocument {
    /// Globally unique identifier, assigned before first persistence.
    pub id: String,

    /// Display name of the resort.
    #[serde(rename = "resortName", default)]
    pub name: String,

    /// Free-text description.
    #[serde(rename = "resortDescription", default)]
    pub description: String,

    /// Store-assigned self link.
    #[serde(rename = "_self", default, skip_serializing)]
    pub self_link: Option<String>,

    /// Resolved images as `data:` URLs, joined in at read time.
    #[serde(skip)]
    pub images: Vec<String>,
}

impl ResortDocument {
    /// Create an unsaved resort with an empty identifier.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Document for ResortDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn self_link(&self) -> Option<&str> {
        self.self_link.as_deref()
    }

    fn set_self_link(&mut self, self_link: String) {
        self.self_link = Some(self_link);
    }

    fn set_images(&mut self, images: Vec<String>) {
        self.images = images;
    }
}
