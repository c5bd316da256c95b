use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::BoxError;

/// A stored state document plus its optimistic concurrency token.
///
/// The token serializes as `eTag` next to the document fields.
///
/// ```
/// use bb_core::StoreItem;
/// use serde_json::json;
///
/// let item: StoreItem = serde_json::from_value(json!({"count": 1, "eTag": "7"})).unwrap();
/// assert_eq!(item.e_tag.as_deref(), Some("7"));
/// assert_eq!(item.document["count"], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

impl StoreItem {
    pub fn new(document: Map<String, Value>) -> Self {
        Self {
            e_tag: None,
            document,
        }
    }

    /// Builds an item from a JSON object, lifting an `eTag` field out of the document.
    pub fn from_value(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(StorageError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn with_etag(mut self, e_tag: impl Into<String>) -> Self {
        self.e_tag = Some(e_tag.into());
        self
    }

    /// Document without the concurrency token.
    pub fn document_value(&self) -> Value {
        Value::Object(self.document.clone())
    }
}

pub type StoreItems = BTreeMap<String, StoreItem>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("etag conflict writing key `{key}`")]
    ETagConflict { key: String },
    #[error("empty etag provided for key `{key}`")]
    EmptyETag { key: String },
    #[error("stored value must be a json object, got {0}")]
    NotAnObject(&'static str),
    #[error("serialization failure")]
    Serialization(#[from] serde_json::Error),
    #[error("storage backend `{backend}` failed")]
    Backend {
        backend: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    pub fn backend(backend: &'static str, err: impl Into<BoxError>) -> Self {
        StorageError::Backend {
            backend,
            source: err.into(),
        }
    }
}

/// Key/value persistence for conversation and user state.
///
/// * `read` omits keys that are not stored.
/// * `write` replaces unconditionally when the item's etag is absent or `*`, otherwise only when
///   the stored etag matches; an empty etag is rejected.
/// * Keys are independent; there is no cross-key transaction.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError>;
    async fn write(&self, changes: StoreItems) -> Result<(), StorageError>;
    async fn delete(&self, keys: &[String]) -> Result<(), StorageError>;
}

pub type SharedStorage = Arc<dyn Storage>;

/// How a single item is written, derived from its etag.
///
/// ```
/// use bb_core::WriteMode;
///
/// assert_eq!(WriteMode::for_item("k", None).unwrap(), WriteMode::Unconditional);
/// assert_eq!(WriteMode::for_item("k", Some("*")).unwrap(), WriteMode::Unconditional);
/// assert_eq!(
///     WriteMode::for_item("k", Some("3")).unwrap(),
///     WriteMode::Conditional("3".into())
/// );
/// assert!(WriteMode::for_item("k", Some("")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    Unconditional,
    Conditional(String),
}

impl WriteMode {
    pub fn for_item(key: &str, e_tag: Option<&str>) -> Result<Self, StorageError> {
        match e_tag {
            None | Some("*") => Ok(WriteMode::Unconditional),
            Some("") => Err(StorageError::EmptyETag {
                key: key.to_string(),
            }),
            Some(tag) => Ok(WriteMode::Conditional(tag.to_string())),
        }
    }
}

/// Fresh opaque concurrency token.
pub fn new_etag() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

const ESCAPED: [char; 8] = ['\\', '?', '/', '#', '\t', '\n', '\r', '*'];
const HASH_SUFFIX_LEN: usize = 17;

/// Escapes characters some backends refuse in keys as `*<hex>` and, when `max_len` is set,
/// truncates long keys keeping a hash suffix so distinct keys stay distinct.
///
/// `max_len` must leave room for the 17 character suffix.
///
/// ```
/// use bb_core::sanitize_key;
///
/// assert_eq!(sanitize_key("a/b?c", None), "a*2fb*3fc");
/// let long = "x".repeat(300);
/// let key = sanitize_key(&long, Some(255));
/// assert_eq!(key.len(), 255);
/// assert_ne!(key, sanitize_key(&"x".repeat(301), Some(255)));
/// ```
pub fn sanitize_key(key: &str, max_len: Option<usize>) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if ESCAPED.contains(&ch) {
            out.push('*');
            out.push_str(&format!("{:x}", ch as u32));
        } else {
            out.push(ch);
        }
    }
    match max_len {
        Some(max) if out.len() > max && max > HASH_SUFFIX_LEN => {
            let digest = hex::encode(Sha256::digest(out.as_bytes()));
            let mut cut = max - HASH_SUFFIX_LEN;
            while !out.is_char_boundary(cut) {
                cut -= 1;
            }
            out.truncate(cut);
            out.push('-');
            out.push_str(&digest[..HASH_SUFFIX_LEN - 1]);
            out
        }
        _ => out,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
