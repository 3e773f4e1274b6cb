//! 프로세스 내부 문서 저장소
//!
//! 외부 데이터베이스 없이 모델 계층을 실행하기 위한 저장소입니다. 컬렉션 데이터는
//! 연결을 끊어도 유지되며, 연결 상태와 횟수를 확인할 수 있습니다.
//!
//! 장애 상황을 재현하는 생성자도 제공합니다.
//!
//! - [`MemoryStore::unreachable`] - 모든 연결 시도가 실패
//! - [`MemoryStore::failing_index_build`] - 지정한 컬렉션의 초기화가 실패
//! - [`MemoryStore::failing_disconnect`] - 연결 해제가 실패하고 연결이 유지됨
//!
//! 컴포넌트로 생성될 때는 `MemoryStore` 설정 레코드의 `unreachable`, `failIndexBuild`,
//! `failDisconnect` 키를 읽습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use log::debug;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde::Deserialize;

use crate::config::config_manager::ConfigManager;
use crate::core::registry::{ComponentRegistration, Container, Instance};
use crate::db::{ConnectOptions, DocumentCollection, DocumentStore, IndexSpec, SharedStore};
use crate::errors::{AppError, AppResult};

#[derive(Default)]
struct CollectionData {
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<Vec<IndexSpec>>,
}

/// 메모리 문서 저장소
#[derive(Default)]
pub struct MemoryStore {
    options: RwLock<Option<ConnectOptions>>,
    collections: RwLock<HashMap<String, Arc<CollectionData>>>,
    unreachable: bool,
    failing_collection: Option<String>,
    failing_disconnect: bool,
    connect_count: AtomicUsize,
    disconnect_count: AtomicUsize,
    query_logging: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결할 수 없는 저장소
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// `collection` 초기화가 항상 실패하는 저장소
    pub fn failing_index_build(collection: &str) -> Self {
        Self {
            failing_collection: Some(collection.to_string()),
            ..Self::default()
        }
    }

    /// 연결 해제가 항상 실패하는 저장소
    pub fn failing_disconnect() -> Self {
        Self {
            failing_disconnect: true,
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    /// 마지막 연결에 사용된 옵션
    pub fn last_connect_options(&self) -> Option<ConnectOptions> {
        read(&self.options).clone()
    }

    pub fn is_query_logging(&self) -> bool {
        self.query_logging.load(Ordering::Relaxed)
    }

    pub fn index_names(&self, collection: &str) -> Vec<String> {
        read(&self.collections)
            .get(collection)
            .map(|data| read(&data.indexes).iter().map(|index| index.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn document_count(&self, collection: &str) -> usize {
        read(&self.collections)
            .get(collection)
            .map(|data| read(&data.documents).len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn connect(&self, uri: &str, options: &ConnectOptions) -> AppResult<()> {
        if self.unreachable {
            return Err(AppError::ConnectionError(format!("{} is unreachable", uri)));
        }
        let mut current = write(&self.options);
        if current.is_some() {
            return Err(AppError::ConnectionError("Memory store is already connected".to_string()));
        }
        *current = Some(options.clone());
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        debug!("Memory store connected: {}", uri);
        Ok(())
    }

    async fn disconnect(&self) -> AppResult<()> {
        if self.failing_disconnect && self.is_connected() {
            return Err(AppError::ConnectionError("Memory store refused to disconnect".to_string()));
        }
        if write(&self.options).take().is_some() {
            self.disconnect_count.fetch_add(1, Ordering::SeqCst);
            debug!("Memory store disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        read(&self.options).is_some()
    }

    fn collection(&self, name: &str) -> AppResult<Arc<dyn DocumentCollection>> {
        let options = self
            .last_connect_options()
            .ok_or_else(|| AppError::ConnectionError("Memory store is not connected".to_string()))?;

        let data = write(&self.collections)
            .entry(name.to_string())
            .or_default()
            .clone();

        Ok(Arc::new(MemoryCollection {
            name: name.to_string(),
            data,
            auto_index: options.auto_index,
            fail_init: self.failing_collection.as_deref() == Some(name),
            query_logging: self.query_logging.clone(),
        }))
    }

    fn set_query_logging(&self, enabled: bool) {
        self.query_logging.store(enabled, Ordering::Relaxed);
    }
}

struct MemoryCollection {
    name: String,
    data: Arc<CollectionData>,
    auto_index: bool,
    fail_init: bool,
    query_logging: Arc<AtomicBool>,
}

impl MemoryCollection {
    fn log_query(&self, operation: &str, detail: &Document) {
        if self.query_logging.load(Ordering::Relaxed) {
            debug!("memory {}.{} {}", self.name, operation, detail);
        }
    }

    fn put_indexes(&self, indexes: &[IndexSpec]) {
        let mut current = write(&self.data.indexes);
        for index in indexes {
            match current.iter_mut().find(|existing| existing.name == index.name) {
                Some(existing) => *existing = index.clone(),
                None => current.push(index.clone()),
            }
        }
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, indexes: &[IndexSpec]) -> AppResult<()> {
        if self.fail_init {
            return Err(AppError::IndexBuildError {
                collection: self.name.clone(),
                message: "index build rejected".to_string(),
            });
        }
        if self.auto_index {
            self.put_indexes(indexes);
        }
        Ok(())
    }

    async fn sync_indexes(&self, indexes: &[IndexSpec]) -> AppResult<()> {
        write(&self.data.indexes).retain(|existing| indexes.iter().any(|index| index.name == existing.name));
        self.put_indexes(indexes);
        Ok(())
    }

    async fn insert_one(&self, mut document: Document) -> AppResult<Bson> {
        self.log_query("insertOne", &document);

        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut documents = write(&self.data.documents);
        if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(AppError::DatabaseError(format!(
                "Duplicate key in {}: {}",
                self.name, id
            )));
        }
        documents.push(document);
        Ok(id)
    }

    async fn find_one(&self, filter: Document, projection: Option<Document>) -> AppResult<Option<Document>> {
        self.log_query("findOne", &filter);

        let documents = read(&self.data.documents);
        let found = documents
            .iter()
            .find(|document| filter.iter().all(|(key, value)| document.get(key) == Some(value)));

        Ok(found.map(|document| match &projection {
            Some(projection) if !projection.is_empty() => project(document, projection),
            _ => document.clone(),
        }))
    }
}

/// 포함(inclusion) 방식 프로젝션. `_id`는 명시적으로 0을 주지 않으면 유지합니다.
fn project(document: &Document, projection: &Document) -> Document {
    let included = |key: &str| match projection.get(key) {
        Some(Bson::Int32(0)) | Some(Bson::Int64(0)) | Some(Bson::Boolean(false)) => false,
        Some(_) => true,
        None => key == "_id",
    };

    document
        .iter()
        .filter(|(key, _)| included(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// `MemoryStore` 설정 레코드. 장애 재현용 키만 있습니다.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoryStoreConfig {
    #[serde(default)]
    unreachable: bool,
    #[serde(default)]
    fail_index_build: Option<String>,
    #[serde(default)]
    fail_disconnect: bool,
}

fn memory_store_component(ioc: &Arc<Container>) -> AppResult<Instance> {
    let config: MemoryStoreConfig = ioc.resolve::<ConfigManager>()?.get_typed("MemoryStore")?;
    let store = MemoryStore {
        unreachable: config.unreachable,
        failing_collection: config.fail_index_build,
        failing_disconnect: config.fail_disconnect,
        ..MemoryStore::default()
    };
    let store: SharedStore = Arc::new(store);
    Ok(Arc::new(store))
}

inventory::submit! {
    ComponentRegistration { name: "MemoryStore", constructor: memory_store_component }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    async fn connected() -> MemoryStore {
        let store = MemoryStore::new();
        store.connect("memory://test", &ConnectOptions::default()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_to_connect() {
        let store = MemoryStore::unreachable();

        let result = store.connect("memory://test", &ConnectOptions::default()).await;

        assert!(matches!(result, Err(AppError::ConnectionError(_))));
        assert_eq!(store.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_find_matches() {
        let store = connected().await;
        let posts = store.collection("post").unwrap();

        let id = posts.insert_one(doc! { "title": "hello", "removed": false }).await.unwrap();
        let found = posts.find_one(doc! { "_id": id.clone() }, None).await.unwrap().unwrap();

        assert_eq!(found.get_str("title").unwrap(), "hello");
        assert!(posts.find_one(doc! { "title": "other" }, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_projection_keeps_listed_fields_and_id() {
        let store = connected().await;
        let posts = store.collection("post").unwrap();
        posts.insert_one(doc! { "title": "a", "content": "body" }).await.unwrap();

        let found = posts
            .find_one(doc! { "title": "a" }, Some(doc! { "title": 1 }))
            .await
            .unwrap()
            .unwrap();

        assert!(found.contains_key("_id"));
        assert!(found.contains_key("title"));
        assert!(!found.contains_key("content"));
    }

    #[tokio::test]
    async fn test_auto_index_disabled_skips_index_creation() {
        let store = MemoryStore::new();
        let options = ConnectOptions {
            auto_index: false,
            ..ConnectOptions::default()
        };
        store.connect("memory://test", &options).await.unwrap();

        let posts = store.collection("post").unwrap();
        posts.init(&[IndexSpec::new("title_1", doc! { "title": 1 })]).await.unwrap();
        assert!(store.index_names("post").is_empty());

        posts.sync_indexes(&[IndexSpec::new("title_1", doc! { "title": 1 })]).await.unwrap();
        assert_eq!(store.index_names("post"), vec!["title_1".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect_is_counted_once() {
        let store = connected().await;

        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();

        assert!(!store.is_connected());
        assert_eq!(store.disconnect_count(), 1);
        assert!(matches!(store.collection("post"), Err(AppError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_failing_disconnect_keeps_connection() {
        let store = MemoryStore::failing_disconnect();
        store.connect("memory://test", &ConnectOptions::default()).await.unwrap();

        let result = store.disconnect().await;

        assert!(matches!(result, Err(AppError::ConnectionError(_))));
        assert!(store.is_connected());
        assert_eq!(store.disconnect_count(), 0);
    }
}
