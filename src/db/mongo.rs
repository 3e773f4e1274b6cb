//! MongoDB 문서 저장소
//!
//! MongoDB 클라이언트 연결을 관리하고 컬렉션 단위 작업을 제공합니다.
//!
//! # 연결 옵션
//!
//! - `app_name`: 모니터링/로그 식별용 애플리케이션 이름
//! - `read_preference`: `SecondaryPreferred`면 보조 노드 우선 읽기
//! - `database`: 지정하지 않으면 URI의 기본 데이터베이스, 그것도 없으면 `cms`
//!
//! # 기본 사용법
//!
//! ```rust,ignore
//! use crate::db::{ConnectOptions, DocumentStore, MongoStore};
//!
//! let store = MongoStore::new();
//! store.connect("mongodb://localhost:27017/cms", &ConnectOptions::default()).await?;
//! let posts = store.collection("post")?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::event::command::CommandEvent;
use mongodb::event::EventHandler;
use mongodb::options::{
    ClientOptions, FindOneOptions, IndexOptions, ReadPreference, SelectionCriteria,
};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::core::registry::{ComponentRegistration, Container, Instance};
use crate::db::{ConnectOptions, DocumentCollection, DocumentStore, IndexSpec, ReadPreferenceMode, SharedStore};
use crate::errors::{AppError, AppResult};

const DEFAULT_DATABASE: &str = "cms";
const NAMESPACE_EXISTS: i32 = 48;
const ID_INDEX: &str = "_id_";

#[derive(Clone)]
struct Connection {
    client: Client,
    database: Database,
    auto_index: bool,
}

/// MongoDB 문서 저장소
///
/// 연결 전에는 컬렉션을 조회할 수 없습니다. 쿼리 로깅 플래그는 연결 시 설치되는
/// 커맨드 이벤트 핸들러와 공유됩니다.
pub struct MongoStore {
    connection: RwLock<Option<Connection>>,
    query_logging: Arc<AtomicBool>,
}

impl Default for MongoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MongoStore {
    pub fn new() -> Self {
        Self {
            connection: RwLock::new(None),
            query_logging: Arc::new(AtomicBool::new(false)),
        }
    }

    fn current(&self) -> Option<Connection> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn query_log_handler(&self) -> EventHandler<CommandEvent> {
        let enabled = self.query_logging.clone();
        EventHandler::callback(move |event: CommandEvent| {
            if !enabled.load(Ordering::Relaxed) {
                return;
            }
            if let CommandEvent::Started(started) = event {
                debug!(
                    "mongodb {}.{} {}",
                    started.db, started.command_name, started.command
                );
            }
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn connect(&self, uri: &str, options: &ConnectOptions) -> AppResult<()> {
        if self.is_connected() {
            return Err(AppError::ConnectionError("MongoDB is already connected".to_string()));
        }

        let mut client_options = ClientOptions::parse(uri)
            .await
            .map_err(|e| AppError::ConnectionError(e.to_string()))?;

        client_options.app_name = Some(options.app_name.clone());
        if options.read_preference == ReadPreferenceMode::SecondaryPreferred {
            client_options.selection_criteria = Some(SelectionCriteria::ReadPreference(
                ReadPreference::SecondaryPreferred {
                    options: Default::default(),
                },
            ));
        }
        client_options.command_event_handler = Some(self.query_log_handler());

        let database_name = options
            .database
            .clone()
            .or_else(|| client_options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| AppError::ConnectionError(e.to_string()))?;
        let database = client.database(&database_name);

        // 연결 테스트
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::ConnectionError(e.to_string()))?;

        info!("✅ MongoDB 연결 성공: {}", database_name);

        *self.connection.write().unwrap_or_else(PoisonError::into_inner) = Some(Connection {
            client,
            database,
            auto_index: options.auto_index,
        });
        Ok(())
    }

    async fn disconnect(&self) -> AppResult<()> {
        let connection = self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(connection) = connection {
            connection.client.shutdown().await;
            info!("MongoDB 연결 종료: {}", connection.database.name());
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    fn collection(&self, name: &str) -> AppResult<Arc<dyn DocumentCollection>> {
        let connection = self
            .current()
            .ok_or_else(|| AppError::ConnectionError("MongoDB is not connected".to_string()))?;

        Ok(Arc::new(MongoCollection {
            name: name.to_string(),
            inner: connection.database.collection::<Document>(name),
            database: connection.database,
            auto_index: connection.auto_index,
        }))
    }

    fn set_query_logging(&self, enabled: bool) {
        self.query_logging.store(enabled, Ordering::Relaxed);
    }
}

struct MongoCollection {
    name: String,
    inner: Collection<Document>,
    database: Database,
    auto_index: bool,
}

impl MongoCollection {
    fn index_error(&self, error: MongoError) -> AppError {
        AppError::IndexBuildError {
            collection: self.name.clone(),
            message: error.to_string(),
        }
    }

    async fn ensure_collection(&self) -> AppResult<()> {
        let names = self
            .database
            .list_collection_names()
            .await
            .map_err(|e| self.index_error(e))?;
        if names.iter().any(|name| *name == self.name) {
            return Ok(());
        }

        match self.database.create_collection(&self.name).await {
            Ok(()) => Ok(()),
            // 다른 프로세스가 먼저 만든 경우
            Err(e) if matches!(*e.kind, ErrorKind::Command(ref c) if c.code == NAMESPACE_EXISTS) => Ok(()),
            Err(e) => Err(self.index_error(e)),
        }
    }

    async fn create_indexes(&self, indexes: &[IndexSpec]) -> AppResult<()> {
        if indexes.is_empty() {
            return Ok(());
        }

        let models = indexes.iter().map(|index| {
            IndexModel::builder()
                .keys(index.keys.clone())
                .options(
                    IndexOptions::builder()
                        .name(index.name.clone())
                        .unique(index.unique)
                        .build(),
                )
                .build()
        });

        self.inner
            .create_indexes(models)
            .await
            .map_err(|e| self.index_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, indexes: &[IndexSpec]) -> AppResult<()> {
        self.ensure_collection().await?;
        if self.auto_index {
            self.create_indexes(indexes).await?;
        }
        Ok(())
    }

    async fn sync_indexes(&self, indexes: &[IndexSpec]) -> AppResult<()> {
        let existing = self
            .inner
            .list_index_names()
            .await
            .map_err(|e| self.index_error(e))?;

        for name in existing {
            if name == ID_INDEX || indexes.iter().any(|index| index.name == name) {
                continue;
            }
            debug!("Dropping index {}.{}", self.name, name);
            self.inner
                .drop_index(name)
                .await
                .map_err(|e| self.index_error(e))?;
        }

        self.create_indexes(indexes).await
    }

    async fn insert_one(&self, document: Document) -> AppResult<Bson> {
        let result = self
            .inner
            .insert_one(document)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.inserted_id)
    }

    async fn find_one(&self, filter: Document, projection: Option<Document>) -> AppResult<Option<Document>> {
        let options = FindOneOptions::builder().projection(projection).build();
        self.inner
            .find_one(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }
}

fn mongo_store_component(_: &Arc<Container>) -> AppResult<Instance> {
    let store: SharedStore = Arc::new(MongoStore::new());
    Ok(Arc::new(store))
}

inventory::submit! {
    ComponentRegistration { name: "MongoStore", constructor: mongo_store_component }
}
