use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};

use resorts_core::{AttachmentRecord, Document, DocumentLink};
use resorts_document::{AttachMode, DocumentError, DocumentStore, Page};

use crate::auth::{MasterKey, rfc1123};
use crate::config::CosmosConfig;
use crate::error::{classify_status, classify_transport};
use crate::resource::Resource;

const API_VERSION: &str = "2018-12-31";
const LIST_QUERY: &str = "SELECT * FROM root";

/// Cosmos DB document store using the SQL REST API via `reqwest`.
///
/// Documents live in a single collection partitioned on `/id`; every
/// document-scoped request carries the document id as its partition key.
/// Attachment feeds are addressed through the document's self link.
pub struct CosmosDocumentStore<T> {
    client: reqwest::Client,
    base_url: String,
    key: MasterKey,
    database: String,
    collection: String,
    throughput: u32,
    page_size: Option<u32>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for CosmosDocumentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosDocumentStore")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<T: Document> CosmosDocumentStore<T> {
    /// Create a new store and make sure the database and collection exist.
    pub async fn new(config: &CosmosConfig) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DocumentError::Configuration(e.to_string()))?;
        let store = Self::with_client(config, client)?;
        store.provision().await?;
        Ok(store)
    }

    /// Create a store with a custom HTTP client, without provisioning.
    pub fn with_client(config: &CosmosConfig, client: reqwest::Client) -> Result<Self, DocumentError> {
        if config.endpoint.trim().is_empty() {
            return Err(DocumentError::Configuration(
                "Cosmos endpoint is empty".to_owned(),
            ));
        }
        Ok(Self {
            client,
            base_url: config.base_url().to_owned(),
            key: MasterKey::from_base64(&config.key)?,
            database: config.database.clone(),
            collection: config.collection.clone(),
            throughput: config.throughput,
            page_size: config.page_size,
            _marker: PhantomData,
        })
    }

    /// Create the database and the collection if they do not already exist.
    ///
    /// A `409 Conflict` answer counts as success.
    #[instrument(skip(self), fields(database = %self.database, collection = %self.collection))]
    pub async fn provision(&self) -> Result<(), DocumentError> {
        let databases = Resource::databases();
        let resp = self
            .send(
                self.request(Method::POST, &databases)?
                    .json(&serde_json::json!({ "id": self.database })),
            )
            .await?;
        if resp.status() == StatusCode::CONFLICT {
            debug!("database already exists");
        } else {
            Self::check(resp, &self.database).await?;
            info!("created database");
        }

        let collections = Resource::collections(&self.database);
        let body = serde_json::json!({
            "id": self.collection,
            "partitionKey": { "paths": ["/id"], "kind": "Hash" },
        });
        let resp = self
            .send(
                self.request(Method::POST, &collections)?
                    .header("x-ms-offer-throughput", self.throughput.to_string())
                    .json(&body),
            )
            .await?;
        if resp.status() == StatusCode::CONFLICT {
            debug!("collection already exists");
        } else {
            Self::check(resp, &self.collection).await?;
            info!(throughput = self.throughput, "created collection");
        }
        Ok(())
    }

    /// Build a signed request for `resource`.
    fn request(&self, method: Method, resource: &Resource) -> Result<RequestBuilder, DocumentError> {
        let date = rfc1123(Utc::now());
        let authorization =
            self.key
                .authorization(method.as_str(), resource.resource_type, &resource.link, &date)?;
        let url = format!("{}/{}", self.base_url, resource.path);
        Ok(self
            .client
            .request(method, url)
            .header("authorization", authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION))
    }

    /// Build a signed request scoped to the partition of document `id`.
    fn partitioned(
        &self,
        method: Method,
        resource: &Resource,
        id: &str,
    ) -> Result<RequestBuilder, DocumentError> {
        let partition_key = serde_json::to_string(&[id])
            .map_err(|e| DocumentError::Serialization(e.to_string()))?;
        Ok(self
            .request(method, resource)?
            .header("x-ms-documentdb-partitionkey", partition_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DocumentError> {
        request.send().await.map_err(|e| classify_transport(&e))
    }

    /// Pass a successful response through; classify anything else.
    async fn check(resp: Response, target: &str) -> Result<Response, DocumentError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &body, target))
    }

    async fn decode<D: DeserializeOwned>(resp: Response) -> Result<D, DocumentError> {
        resp.json::<D>().await.map_err(|e| classify_transport(&e))
    }

    fn body_for(id: &str, item: &T) -> Result<Value, DocumentError> {
        let mut body =
            serde_json::to_value(item).map_err(|e| DocumentError::Serialization(e.to_string()))?;
        match &mut body {
            Value::Object(map) => {
                map.insert("id".to_owned(), Value::String(id.to_owned()));
                Ok(body)
            }
            _ => Err(DocumentError::Serialization(
                "document must serialize to a JSON object".to_owned(),
            )),
        }
    }

    fn continuation_of(resp: &Response) -> Option<String> {
        resp.headers()
            .get("x-ms-continuation")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}

// ---------------------------------------------------------------------------
// Cosmos DB response types (internal)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct QueryResponse<D> {
    #[serde(rename = "Documents")]
    documents: Vec<D>,
}

#[derive(Deserialize)]
struct AttachmentFeed {
    #[serde(rename = "Attachments")]
    attachments: Vec<AttachmentRecord>,
}

#[async_trait]
impl<T: Document> DocumentStore<T> for CosmosDocumentStore<T> {
    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn read_page(&self, continuation: Option<&str>) -> Result<Page<T>, DocumentError> {
        let resource = Resource::documents(&self.database, &self.collection);
        let mut request = self
            .request(Method::POST, &resource)?
            .header("content-type", "application/query+json")
            .header("x-ms-documentdb-isquery", "True")
            .header("x-ms-documentdb-query-enablecrosspartition", "True")
            .body(serde_json::json!({ "query": LIST_QUERY, "parameters": [] }).to_string());
        if let Some(size) = self.page_size {
            request = request.header("x-ms-max-item-count", size.to_string());
        }
        if let Some(token) = continuation {
            request = request.header("x-ms-continuation", token);
        }

        let resp = Self::check(self.send(request).await?, &self.collection).await?;
        let continuation = Self::continuation_of(&resp);
        let page: QueryResponse<T> = Self::decode(resp).await?;
        debug!(count = page.documents.len(), more = continuation.is_some(), "read page");
        Ok(Page {
            items: page.documents,
            continuation,
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<T>, DocumentError> {
        let resource = Resource::document(&self.database, &self.collection, id);
        let resp = self
            .send(self.partitioned(Method::GET, &resource, id)?)
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check(resp, id).await?;
        Self::decode(resp).await.map(Some)
    }

    #[instrument(skip(self, item), fields(id = %item.id()))]
    async fn insert(&self, item: &T) -> Result<T, DocumentError> {
        if item.id().is_empty() {
            return Err(DocumentError::Invalid("document id is empty".to_owned()));
        }
        let body = Self::body_for(item.id(), item)?;
        let resource = Resource::documents(&self.database, &self.collection);
        let resp = self
            .send(
                self.partitioned(Method::POST, &resource, item.id())?
                    .json(&body),
            )
            .await?;
        let stored: T = Self::decode(Self::check(resp, item.id()).await?).await?;
        info!(self_link = stored.self_link().unwrap_or_default(), "document created");
        Ok(stored)
    }

    #[instrument(skip(self, item))]
    async fn replace(&self, id: &str, item: &T) -> Result<T, DocumentError> {
        let body = Self::body_for(id, item)?;
        let resource = Resource::document(&self.database, &self.collection, id);
        let resp = self
            .send(self.partitioned(Method::PUT, &resource, id)?.json(&body))
            .await?;
        let stored: T = Self::decode(Self::check(resp, id).await?).await?;
        info!("document replaced");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, DocumentError> {
        let resource = Resource::document(&self.database, &self.collection, id);
        let resp = self
            .send(self.partitioned(Method::DELETE, &resource, id)?)
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(resp, id).await?;
        info!("document deleted");
        Ok(true)
    }

    #[instrument(skip(self, link, record), fields(id = %link.id, attachment = %record.id))]
    async fn write_attachment(
        &self,
        link: &DocumentLink,
        record: &AttachmentRecord,
        mode: AttachMode,
    ) -> Result<(), DocumentError> {
        let resource = Resource::attachments(link);
        let mut request = self
            .partitioned(Method::POST, &resource, &link.id)?
            .json(record);
        if mode == AttachMode::Upsert {
            request = request.header("x-ms-documentdb-is-upsert", "True");
        }
        let target = format!("{}/attachments/{}", link.trimmed(), record.id);
        Self::check(self.send(request).await?, &target).await?;
        Ok(())
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    async fn list_attachments(
        &self,
        link: &DocumentLink,
    ) -> Result<Vec<AttachmentRecord>, DocumentError> {
        let resource = Resource::attachments(link);
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self.partitioned(Method::GET, &resource, &link.id)?;
            if let Some(token) = &continuation {
                request = request.header("x-ms-continuation", token);
            }
            let resp = Self::check(self.send(request).await?, &link.self_link).await?;
            continuation = Self::continuation_of(&resp);
            let feed: AttachmentFeed = Self::decode(resp).await?;
            records.extend(feed.attachments);
            if continuation.is_none() {
                break;
            }
        }
        Ok(records)
    }
}
