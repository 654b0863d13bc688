//! Document-store boundary: collection-scoped CRUD plus an
//! equality+ordering query.
//!
//! The remote service is assumed to provide durability and consistency;
//! failures are reported verbatim upward with no retry. The in-memory
//! implementation backs demos and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document, returning its generated id.
    async fn insert(&self, collection: &str, doc: JsonValue) -> AppResult<String>;
    async fn fetch(&self, collection: &str, id: &str) -> AppResult<JsonValue>;
    /// All documents where `field` equals `value`, ordered by `order_by`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
        order_by: &str,
        order: SortOrder,
    ) -> AppResult<Vec<(String, JsonValue)>>;
    /// Partial merge of `fields` into an existing document.
    async fn patch(&self, collection: &str, id: &str, fields: JsonValue) -> AppResult<()>;
    async fn remove(&self, collection: &str, id: &str) -> AppResult<()>;
}

pub struct HttpDocumentStore {
    base: String,
    client: reqwest::Client,
}

impl HttpDocumentStore {
    pub fn new(base: &str) -> Self {
        Self { base: base.trim_end_matches('/').to_string(), client: reqwest::Client::new() }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base, collection)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base, collection, id)
    }

    async fn read_body(resp: reqwest::Response) -> AppResult<JsonValue> {
        let status = resp.status();
        let val: JsonValue = resp.json().await.unwrap_or_else(|_| json!({}));
        if !status.is_success() {
            let message = val
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("document store error: HTTP {status}"));
            return Err(AppError::unknown(message));
        }
        Ok(val)
    }
}

fn transport(e: reqwest::Error) -> AppError {
    AppError::unknown(format!("document store unreachable: {e}"))
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn insert(&self, collection: &str, doc: JsonValue) -> AppResult<String> {
        let resp = self
            .client
            .post(self.collection_url(collection))
            .json(&doc)
            .send()
            .await
            .map_err(transport)?;
        let val = Self::read_body(resp).await?;
        val.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::unknown("document store returned no id"))
    }

    async fn fetch(&self, collection: &str, id: &str) -> AppResult<JsonValue> {
        let resp = self
            .client
            .get(self.doc_url(collection, id))
            .send()
            .await
            .map_err(transport)?;
        let val = Self::read_body(resp).await?;
        Ok(val.get("doc").cloned().unwrap_or(val))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
        order_by: &str,
        order: SortOrder,
    ) -> AppResult<Vec<(String, JsonValue)>> {
        let direction = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        let body = json!({
            "where": {"field": field, "op": "==", "value": value},
            "orderBy": {"field": order_by, "direction": direction},
        });
        let resp = self
            .client
            .post(format!("{}:query", self.collection_url(collection)))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let val = Self::read_body(resp).await?;
        let docs = val
            .get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();
        let mut out = Vec::with_capacity(docs.len());
        for entry in docs {
            let id = entry
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| AppError::unknown("query result entry without id"))?
                .to_string();
            let doc = entry.get("doc").cloned().unwrap_or(JsonValue::Null);
            out.push((id, doc));
        }
        Ok(out)
    }

    async fn patch(&self, collection: &str, id: &str, fields: JsonValue) -> AppResult<()> {
        let resp = self
            .client
            .patch(self.doc_url(collection, id))
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        Self::read_body(resp).await?;
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> AppResult<()> {
        let resp = self
            .client
            .delete(self.doc_url(collection, id))
            .send()
            .await
            .map_err(transport)?;
        Self::read_body(resp).await?;
        Ok(())
    }
}

/// In-memory document store with the same contract; insertion order is
/// kept per collection so query ordering is deterministic under ties.
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<(String, JsonValue)>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self { collections: RwLock::new(HashMap::new()) }
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Field comparison for ordering: numbers before strings, missing first.
fn cmp_field(a: Option<&JsonValue>, b: Option<&JsonValue>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                xi.cmp(&yi)
            } else if let (Some(xf), Some(yf)) = (x.as_f64(), y.as_f64()) {
                xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
            } else {
                let xs = x.as_str().map(str::to_string).unwrap_or_else(|| x.to_string());
                let ys = y.as_str().map(str::to_string).unwrap_or_else(|| y.to_string());
                xs.cmp(&ys)
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, doc: JsonValue) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), doc));
        Ok(id)
    }

    async fn fetch(&self, collection: &str, id: &str) -> AppResult<JsonValue> {
        self.collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|(did, _)| did == id))
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| AppError::unknown(format!("document not found: {collection}/{id}")))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: JsonValue,
        order_by: &str,
        order: SortOrder,
    ) -> AppResult<Vec<(String, JsonValue)>> {
        let mut hits: Vec<(String, JsonValue)> = self
            .collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| doc.get(field) == Some(&value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|(_, a), (_, b)| {
            let ord = cmp_field(a.get(order_by), b.get(order_by));
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        Ok(hits)
    }

    async fn patch(&self, collection: &str, id: &str, fields: JsonValue) -> AppResult<()> {
        let mut collections = self.collections.write();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::unknown(format!("document not found: {collection}/{id}")))?;
        let (_, doc) = docs
            .iter_mut()
            .find(|(did, _)| did == id)
            .ok_or_else(|| AppError::unknown(format!("document not found: {collection}/{id}")))?;
        if let (Some(target), Some(patch)) = (doc.as_object_mut(), fields.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> AppResult<()> {
        let mut collections = self.collections.write();
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|(did, _)| did != id);
        }
        Ok(())
    }
}
