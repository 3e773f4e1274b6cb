//! Document Store Module
//!
//! 모델 계층이 사용하는 문서 저장소 추상화입니다. 연결/해제, 컬렉션 초기화,
//! 인덱스 생성, 단건 삽입/조회만 다룹니다.
//!
//! # 구현체
//!
//! | 구현체 | 설명 |
//! |--------|------|
//! | [`mongo::MongoStore`] | MongoDB 드라이버 기반 (기본값) |
//! | [`memory::MemoryStore`] | 프로세스 내부 저장소 (로컬 실행, 테스트) |
//!
//! 구현체는 설정의 `DocumentStore` 항목으로 선택합니다.
//!
//! ```json
//! { "class": "DocumentStore", "implementation": "MemoryStore" }
//! ```

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::core::registry::Container;
use crate::errors::AppResult;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// 컨테이너에서 문서 저장소를 조회하는 식별자
pub const STORE_ID: &str = "DocumentStore";

/// 공유 문서 저장소 핸들
pub type SharedStore = Arc<dyn DocumentStore>;

/// 컨테이너에 바인딩된 문서 저장소를 꺼냅니다.
pub fn resolve_store(ioc: &Container) -> AppResult<SharedStore> {
    Ok(ioc.get::<SharedStore>(STORE_ID)?.as_ref().clone())
}

/// 컬렉션 인덱스 정의
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Document,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, keys: Document) -> Self {
        Self {
            name: name.into(),
            keys,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPreferenceMode {
    #[default]
    Primary,
    SecondaryPreferred,
}

/// 연결 옵션
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    /// 컬렉션 초기화 시 인덱스 자동 생성 여부
    pub auto_index: bool,
    pub read_preference: ReadPreferenceMode,
    /// 사용할 데이터베이스 (없으면 URI의 기본 데이터베이스)
    pub database: Option<String>,
    pub app_name: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            auto_index: true,
            read_preference: ReadPreferenceMode::Primary,
            database: None,
            app_name: "cms_backend".to_string(),
        }
    }
}

/// 문서 저장소
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 저장소에 연결합니다. 연결 실패는 `ConnectionError`입니다.
    async fn connect(&self, uri: &str, options: &ConnectOptions) -> AppResult<()>;

    /// 연결을 끊습니다. 연결되어 있지 않으면 아무것도 하지 않습니다.
    async fn disconnect(&self) -> AppResult<()>;

    fn is_connected(&self) -> bool;

    /// 연결된 데이터베이스의 컬렉션 핸들
    fn collection(&self, name: &str) -> AppResult<Arc<dyn DocumentCollection>>;

    /// 개별 쿼리 로깅 토글
    fn set_query_logging(&self, enabled: bool);
}

/// 컬렉션 단위 작업
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    /// 컬렉션을 만들고, 연결 옵션이 허용하면 인덱스를 생성합니다.
    async fn init(&self, indexes: &[IndexSpec]) -> AppResult<()>;

    /// 정의에 없는 인덱스를 지우고 정의된 인덱스를 만듭니다.
    async fn sync_indexes(&self, indexes: &[IndexSpec]) -> AppResult<()>;

    /// 문서를 삽입하고 생성된 `_id`를 반환합니다.
    async fn insert_one(&self, document: Document) -> AppResult<Bson>;

    async fn find_one(&self, filter: Document, projection: Option<Document>) -> AppResult<Option<Document>>;
}
