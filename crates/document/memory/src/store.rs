use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use serde_json::Value;
use tracing::debug;

use resorts_core::{AttachmentRecord, Document, DocumentLink};
use resorts_document::{AttachMode, DocumentError, DocumentStore, Page};

const DEFAULT_PAGE_SIZE: usize = 100;

/// A persisted document: its serialized body plus store metadata.
#[derive(Debug, Clone)]
struct Entry {
    body: Value,
    self_link: String,
    seq: u64,
    attachments: Vec<AttachmentRecord>,
}

/// In-memory [`DocumentStore`] backed by a [`DashMap`].
///
/// Bodies are kept in their serialized form so reads go through the same
/// deserialization path as a remote store. Documents are listed in insertion
/// order, `page_size` at a time.
#[derive(Debug)]
pub struct MemoryDocumentStore<T> {
    collection: String,
    page_size: usize,
    next_seq: AtomicU64,
    data: DashMap<String, Entry>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for MemoryDocumentStore<T> {
    fn default() -> Self {
        Self::new("resorts")
    }
}

impl<T> MemoryDocumentStore<T> {
    /// Create a new, empty store for the named collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            page_size: DEFAULT_PAGE_SIZE,
            next_seq: AtomicU64::new(1),
            data: DashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Set the number of documents returned per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn self_link_for(&self, seq: u64) -> String {
        format!("dbs/memory/colls/{}/docs/{seq}/", self.collection)
    }
}

impl<T: Document> MemoryDocumentStore<T> {
    fn encode(item: &T) -> Result<Value, DocumentError> {
        let body = serde_json::to_value(item)
            .map_err(|e| DocumentError::Serialization(e.to_string()))?;
        if !body.is_object() {
            return Err(DocumentError::Serialization(
                "document must serialize to a JSON object".to_owned(),
            ));
        }
        Ok(body)
    }

    fn decode(entry: &Entry) -> Result<T, DocumentError> {
        let mut body = entry.body.clone();
        if let Value::Object(map) = &mut body {
            map.insert("_self".to_owned(), Value::String(entry.self_link.clone()));
        }
        serde_json::from_value(body).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Confirm that `link` addresses a stored document.
    fn check_link(&self, link: &DocumentLink) -> Result<(), DocumentError> {
        match self.data.get(&link.id) {
            Some(entry) if entry.self_link.trim_matches('/') == link.trimmed() => Ok(()),
            _ => Err(DocumentError::NotFound(link.self_link.clone())),
        }
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MemoryDocumentStore<T> {
    async fn read_page(&self, continuation: Option<&str>) -> Result<Page<T>, DocumentError> {
        let start: u64 = match continuation {
            Some(token) => token
                .parse()
                .map_err(|_| DocumentError::Invalid(format!("bad continuation token '{token}'")))?,
            None => 0,
        };

        let mut entries: Vec<Entry> = self
            .data
            .iter()
            .filter(|e| e.seq >= start)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.seq);

        let continuation = entries.get(self.page_size).map(|e| e.seq.to_string());
        let items = entries
            .iter()
            .take(self.page_size)
            .map(Self::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            continuation,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<T>, DocumentError> {
        self.data.get(id).map(|entry| Self::decode(&entry)).transpose()
    }

    async fn insert(&self, item: &T) -> Result<T, DocumentError> {
        if item.id().is_empty() {
            return Err(DocumentError::Invalid("document id is empty".to_owned()));
        }
        let body = Self::encode(item)?;
        let entry = match self.data.entry(item.id().to_owned()) {
            MapEntry::Occupied(_) => return Err(DocumentError::Conflict(item.id().to_owned())),
            MapEntry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                let entry = Entry {
                    body,
                    self_link: self.self_link_for(seq),
                    seq,
                    attachments: Vec::new(),
                };
                slot.insert(entry.clone());
                entry
            }
        };
        debug!(id = %item.id(), self_link = %entry.self_link, "document inserted");
        Self::decode(&entry)
    }

    async fn replace(&self, id: &str, item: &T) -> Result<T, DocumentError> {
        let mut body = Self::encode(item)?;
        if let Value::Object(map) = &mut body {
            map.insert("id".to_owned(), Value::String(id.to_owned()));
        }
        let mut entry = self
            .data
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_owned()))?;
        entry.body = body;
        debug!(id, "document replaced");
        Self::decode(&entry)
    }

    async fn delete(&self, id: &str) -> Result<bool, DocumentError> {
        Ok(self.data.remove(id).is_some())
    }

    async fn write_attachment(
        &self,
        link: &DocumentLink,
        record: &AttachmentRecord,
        mode: AttachMode,
    ) -> Result<(), DocumentError> {
        self.check_link(link)?;
        let mut entry = self
            .data
            .get_mut(&link.id)
            .ok_or_else(|| DocumentError::NotFound(link.self_link.clone()))?;
        let position = entry.attachments.iter().position(|a| a.id == record.id);
        match (position, mode) {
            (Some(_), AttachMode::Create) => {
                return Err(DocumentError::Conflict(format!(
                    "{}/attachments/{}",
                    link.trimmed(),
                    record.id
                )));
            }
            (Some(index), AttachMode::Upsert) => entry.attachments[index].clone_from(record),
            (None, _) => entry.attachments.push(record.clone()),
        }
        Ok(())
    }

    async fn list_attachments(
        &self,
        link: &DocumentLink,
    ) -> Result<Vec<AttachmentRecord>, DocumentError> {
        self.check_link(link)?;
        self.data
            .get(&link.id)
            .map(|entry| entry.attachments.clone())
            .ok_or_else(|| DocumentError::NotFound(link.self_link.clone()))
    }
}
