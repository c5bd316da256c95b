use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{BoxError, Storage, StorageError, StoreItem, StoreItems, WriteMode, sanitize_key};
use bb_telemetry::{Outcome, record_storage_op};
use futures::future::try_join_all;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "azure_table";
const MAX_KEY_LEN: usize = 1024;
const API_VERSION: &str = "2019-02-02";

/// A table entity holding one state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
    /// Serialized JSON document.
    #[serde(rename = "Document")]
    pub document: String,
    #[serde(skip)]
    pub e_tag: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("table service error: {0}")]
    Service(#[source] BoxError),
}

#[async_trait]
pub trait TableClient: Send + Sync {
    async fn get_entity(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError>;

    /// Insert-or-replace when `if_match` is `None`, otherwise update guarded by `If-Match`.
    async fn put_entity(
        &self,
        entity: TableEntity,
        if_match: Option<&str>,
    ) -> Result<(), TableError>;

    /// Deletes with `If-Match: *`. A missing entity is not an error.
    async fn delete_entity(&self, partition_key: &str, row_key: &str) -> Result<(), TableError>;
}

/// Storage over Azure Table storage. The etag is the service's entity etag.
pub struct AzureTableStorage<C> {
    client: Arc<C>,
}

impl<C: TableClient> AzureTableStorage<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    async fn read_one(&self, key: &str) -> Result<Option<(String, StoreItem)>, StorageError> {
        let entity = self
            .client
            .get_entity(&partition_key(key), "")
            .await
            .map_err(|err| StorageError::backend(PROVIDER, err))?;
        let Some(entity) = entity else {
            return Ok(None);
        };
        let document: serde_json::Value = serde_json::from_str(&entity.document)?;
        let mut item = StoreItem::from_value(document)?;
        item.e_tag = entity.e_tag;
        Ok(Some((key.to_string(), item)))
    }

    async fn write_one(&self, key: String, item: StoreItem) -> Result<(), StorageError> {
        let mode = WriteMode::for_item(&key, item.e_tag.as_deref())?;
        let entity = TableEntity {
            partition_key: partition_key(&key),
            row_key: String::new(),
            document: serde_json::to_string(&item.document)?,
            e_tag: None,
        };
        let if_match = match &mode {
            WriteMode::Unconditional => None,
            WriteMode::Conditional(tag) => Some(tag.as_str()),
        };
        match self.client.put_entity(entity, if_match).await {
            Ok(()) => Ok(()),
            Err(TableError::PreconditionFailed) => Err(StorageError::ETagConflict { key }),
            Err(err) => Err(StorageError::backend(PROVIDER, err)),
        }
    }
}

fn partition_key(key: &str) -> String {
    sanitize_key(key, Some(MAX_KEY_LEN))
}

#[async_trait]
impl<C: TableClient> Storage for AzureTableStorage<C> {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        let result = try_join_all(keys.iter().map(|key| self.read_one(key)))
            .await
            .map(|found| found.into_iter().flatten().collect::<StoreItems>());
        if let Ok(items) = &result {
            debug!(provider = PROVIDER, requested = keys.len(), found = items.len(), "read");
        }
        record_storage_op(PROVIDER, "read", Outcome::of(&result));
        result
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        let count = changes.len();
        let result = try_join_all(
            changes
                .into_iter()
                .map(|(key, item)| self.write_one(key, item)),
        )
        .await
        .map(|_| ());
        debug!(provider = PROVIDER, count, ok = result.is_ok(), "write");
        record_storage_op(PROVIDER, "write", Outcome::of(&result));
        result
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let result = try_join_all(keys.iter().map(|key| async move {
            self.client.delete_entity(&partition_key(key), "").await
        }))
        .await
        .map(|_| ())
        .map_err(|err| StorageError::backend(PROVIDER, err));
        debug!(provider = PROVIDER, requested = keys.len(), ok = result.is_ok(), "delete");
        record_storage_op(PROVIDER, "delete", Outcome::of(&result));
        result
    }
}

/// Table service REST client authenticated with a SAS token.
pub struct AzureTableRestClient {
    http: Client,
    endpoint: String,
    table: String,
    sas_token: String,
}

impl AzureTableRestClient {
    /// `endpoint` is the account table endpoint, e.g. `https://acct.table.core.windows.net`.
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        table: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            table: table.into(),
            sas_token: sas_token.into().trim_start_matches('?').to_string(),
        }
    }

    pub fn entity_url(&self, partition_key: &str, row_key: &str) -> String {
        format!(
            "{}/{}(PartitionKey='{}',RowKey='{}')?{}",
            self.endpoint,
            self.table,
            odata_literal(partition_key),
            odata_literal(row_key),
            self.sas_token
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("x-ms-version", API_VERSION)
            .header(header::ACCEPT, "application/json;odata=nometadata")
    }
}

/// Quotes doubled, then percent-encoded for the URL path.
fn odata_literal(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

fn service(err: reqwest::Error) -> TableError {
    TableError::Service(Box::new(err))
}

fn unexpected(status: StatusCode) -> TableError {
    TableError::Service(format!("unexpected table service status {status}").into())
}

#[async_trait]
impl TableClient for AzureTableRestClient {
    async fn get_entity(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, TableError> {
        let response = self
            .request(reqwest::Method::GET, self.entity_url(partition_key, row_key))
            .send()
            .await
            .map_err(service)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let e_tag = response
                    .headers()
                    .get(header::ETAG)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let mut entity: TableEntity = response.json().await.map_err(service)?;
                entity.e_tag = e_tag;
                Ok(Some(entity))
            }
            status => Err(unexpected(status)),
        }
    }

    async fn put_entity(
        &self,
        entity: TableEntity,
        if_match: Option<&str>,
    ) -> Result<(), TableError> {
        let url = self.entity_url(&entity.partition_key, &entity.row_key);
        let mut request = self
            .request(reqwest::Method::PUT, url)
            .json(&entity);
        if let Some(tag) = if_match {
            request = request.header(header::IF_MATCH, tag);
        }
        let response = request.send().await.map_err(service)?;
        match response.status() {
            status if status.is_success() => {
                debug!(provider = PROVIDER, conditional = if_match.is_some(), "entity stored");
                Ok(())
            }
            // Update with If-Match against a missing entity answers 404.
            StatusCode::PRECONDITION_FAILED | StatusCode::NOT_FOUND if if_match.is_some() => {
                Err(TableError::PreconditionFailed)
            }
            status => Err(unexpected(status)),
        }
    }

    async fn delete_entity(&self, partition_key: &str, row_key: &str) -> Result<(), TableError> {
        let response = self
            .request(reqwest::Method::DELETE, self.entity_url(partition_key, row_key))
            .header(header::IF_MATCH, "*")
            .send()
            .await
            .map_err(service)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(unexpected(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct FakeTableService {
        entities: Mutex<HashMap<String, TableEntity>>,
        seq: AtomicU64,
    }

    #[async_trait]
    impl TableClient for FakeTableService {
        async fn get_entity(&self, pk: &str, _rk: &str) -> Result<Option<TableEntity>, TableError> {
            Ok(self.entities.lock().unwrap().get(pk).cloned())
        }

        async fn put_entity(
            &self,
            mut entity: TableEntity,
            if_match: Option<&str>,
        ) -> Result<(), TableError> {
            let mut entities = self.entities.lock().unwrap();
            if let Some(tag) = if_match {
                let current = entities.get(&entity.partition_key);
                if current.and_then(|e| e.e_tag.as_deref()) != Some(tag) {
                    return Err(TableError::PreconditionFailed);
                }
            }
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            entity.e_tag = Some(format!("W/\"datetime'{seq}'\""));
            entities.insert(entity.partition_key.clone(), entity);
            Ok(())
        }

        async fn delete_entity(&self, pk: &str, _rk: &str) -> Result<(), TableError> {
            self.entities.lock().unwrap().remove(pk);
            Ok(())
        }
    }

    #[tokio::test]
    async fn passes_storage_conformance() {
        let store = AzureTableStorage::new(Arc::new(FakeTableService::default()));
        bb_testutil::storage::assert_conformance(&store).await;
    }

    #[tokio::test]
    async fn documents_are_stored_as_json_strings() {
        let service = Arc::new(FakeTableService::default());
        let store = AzureTableStorage::new(service.clone());
        store
            .write([("user#1".to_string(), bb_testutil::storage::item(serde_json::json!({"a": 1})))].into())
            .await
            .unwrap();
        let entities = service.entities.lock().unwrap();
        let entity = &entities["user*231"];
        assert_eq!(entity.row_key, "");
        assert_eq!(entity.document, r#"{"a":1}"#);
    }

    #[test]
    fn entity_url_quotes_keys() {
        let client = AzureTableRestClient::new(
            Client::new(),
            "https://acct.table.core.windows.net/",
            "state",
            "?sv=2019&sig=abc",
        );
        assert_eq!(
            client.entity_url("o'neil", ""),
            "https://acct.table.core.windows.net/state(PartitionKey='o%27%27neil',RowKey='')?sv=2019&sig=abc"
        );
    }

    #[test]
    fn entity_serializes_with_service_field_names() {
        let entity = TableEntity {
            partition_key: "k".into(),
            row_key: String::new(),
            document: "{}".into(),
            e_tag: Some("x".into()),
        };
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            serde_json::json!({"PartitionKey": "k", "RowKey": "", "Document": "{}"})
        );
    }
}
