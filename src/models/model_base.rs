//! # Model Lifecycle Manager
//!
//! 스키마/리포지토리 유닛을 발견하여 컨테이너에 바인딩하고, 문서 저장소에 연결한 뒤
//! 모든 컬렉션의 인덱스 생성을 기다리는 상태 기계입니다.
//!
//! ## 상태 전이
//!
//! ```text
//! Uninitialized ─init()─▶ Connecting ─▶ DiscoveringSchemas ─▶ BindingModels
//!                              │                                    │
//!                              ▼                                    ▼
//!                           Failed ◀──────────────────────── BuildingIndexes
//!                                                                   │
//!                                          Closed ◀─close()─── Ready
//! ```
//!
//! ## init() 단계
//!
//! 1. 스키마 유닛 디스커버리 (`autoRegisterModels`면 매핑에 자동 등록)
//! 2. 리포지토리 유닛 검증 (유닛당 정확히 하나)
//! 3. 저장소 연결 (실패 시 finalizer 등록 전에 `ConnectionError`)
//! 4. `close()`를 호출하는 finalizer 등록
//! 5. 리포지토리/스키마 바인딩 후 모델별 인덱스 생성 태스크 대기
//! 6. 실패 시 `Failed` 상태로 에러 전파 (호출자가 `finalize()` 실행)
//! 7. 성공 시 `Ready`, Logger가 debug면 쿼리 로깅 활성화
//!
//! ## 설정
//!
//! ```json
//! {
//!   "class": "Model",
//!   "config": {
//!     "mongoUri": "${MONGODB_URI}",
//!     "createIndexes": true,
//!     "syncIndexes": false,
//!     "secondaryPreferred": false,
//!     "autoRegisterModels": true
//!   }
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::future::try_join;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;

use crate::core::base::ComponentBase;
use crate::core::finalizer::OwnerId;
use crate::core::registry::{Component, ComponentRegistration, Container, Instance, Lifetime};
use crate::db::{resolve_store, ConnectOptions, ReadPreferenceMode, SharedStore};
use crate::errors::{AppError, AppResult, ErrorContext};
use crate::models::discovery::{Discovery, RepositoryDescriptor};
use crate::models::model::{Model, ModelHandle};
use crate::models::schema::{Schema, SchemaDescriptor};
use crate::utils::display_terminal::{
    print_boxed_title, print_model_summary, print_step_complete, print_step_start,
};

/// 두 번째 인스턴스 생성을 막는 가드 바인딩 식별자
pub const MODEL_BASE_ID: &str = "ModelBase";

fn default_true() -> bool {
    true
}

/// `Model` 설정 레코드
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub mongo_uri: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub sync_indexes: bool,
    #[serde(default = "default_true")]
    pub create_indexes: bool,
    #[serde(default)]
    pub secondary_preferred: bool,
    #[serde(default = "default_true")]
    pub auto_register_models: bool,
}

impl ModelConfig {
    /// `secondaryPreferred`는 `createIndexes`와 관계없이 자동 인덱스 생성을 끕니다.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            auto_index: !self.secondary_preferred && self.create_indexes,
            read_preference: if self.secondary_preferred {
                ReadPreferenceMode::SecondaryPreferred
            } else {
                ReadPreferenceMode::Primary
            },
            database: self.database.clone(),
            ..ConnectOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Uninitialized,
    Connecting,
    DiscoveringSchemas,
    BindingModels,
    BuildingIndexes,
    Ready,
    Failed,
    Closed,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 모델 생명주기 관리자
///
/// 프로세스당 하나만 존재할 수 있습니다. 생성 시 컨테이너에 `ModelBase`를 바인딩하고,
/// 이미 바인딩되어 있으면 생성이 실패합니다.
pub struct ModelManager {
    base: ComponentBase,
    config: ModelConfig,
    store: SharedStore,
    discovery: Discovery,
    owner: OwnerId,
    state: Mutex<ModelState>,
    mapping: Mutex<Vec<SchemaDescriptor>>,
    this: Weak<ModelManager>,
}

impl Component for ModelManager {
    const ID: &'static str = "Model";
}

impl ModelManager {
    /// # Errors
    ///
    /// - `ModelBase`가 이미 바인딩됨 → `ConfigurationError`
    /// - `mongoUri` 누락 등 설정 오류 → `ConfigurationError`
    pub fn new(ioc: &Arc<Container>, discovery: Discovery) -> AppResult<Arc<Self>> {
        if ioc.is_bound(MODEL_BASE_ID) {
            return Err(AppError::ConfigurationError(
                "Can't have more than one instance of ModelBase".to_string(),
            ));
        }

        let base = ComponentBase::new(ioc, Self::ID)?;
        let config: ModelConfig = base.typed_config()?;
        let store = resolve_store(ioc)?;

        let manager = Arc::new_cyclic(|this| Self {
            base,
            config,
            store,
            discovery,
            owner: OwnerId::new(Self::ID),
            state: Mutex::new(ModelState::Uninitialized),
            mapping: Mutex::new(Vec::new()),
            this: this.clone(),
        });

        ioc.bind_constant(MODEL_BASE_ID, manager.clone()).map_err(|_| {
            AppError::ConfigurationError("Can't have more than one instance of ModelBase".to_string())
        })?;
        Ok(manager)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn state(&self) -> ModelState {
        *self.lock_state()
    }

    /// `Ready`에 도달한 적이 있으면 `close()` 이후에도 참입니다.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state(), ModelState::Ready | ModelState::Closed)
    }

    /// 스키마를 모델 매핑에 등록합니다. 등록 키는 논리 이름입니다.
    ///
    /// # Errors
    ///
    /// - 이미 등록된 논리 이름 → `DiscoveryError`
    /// - `init()` 이후 호출 → `AlreadyInitialized`
    pub fn register_schemas(&self, descriptors: Vec<SchemaDescriptor>) -> AppResult<()> {
        if self.state() != ModelState::Uninitialized {
            return Err(AppError::AlreadyInitialized(
                "Schemas must be registered before model init".to_string(),
            ));
        }

        let mut mapping = self.lock_mapping();
        for (index, descriptor) in descriptors.iter().enumerate() {
            let name = descriptor.logical_name();
            let duplicated = mapping.iter().any(|mapped| mapped.logical_name() == name)
                || descriptors[..index].iter().any(|earlier| earlier.logical_name() == name);
            if duplicated {
                return Err(AppError::DiscoveryError(format!(
                    "Class for '{}' can't be defined twice",
                    descriptor.model_key()
                )));
            }
        }
        mapping.extend(descriptors);
        Ok(())
    }

    /// 등록된 스키마의 모델 핸들
    ///
    /// # Errors
    ///
    /// 초기화가 끝나지 않았거나 매핑에 없는 스키마면 `NotRegistered`입니다.
    pub fn get_model<T: Schema>(&self) -> AppResult<Model<T>> {
        if !self.is_initialized() {
            return Err(AppError::NotRegistered(format!(
                "Model for class '{}' isn't available before init",
                T::NAME
            )));
        }
        // 오버라이드 구현 타입은 자신의 이름으로도 기본 모델을 찾을 수 있습니다
        let key = self
            .lock_mapping()
            .iter()
            .find(|mapped| mapped.logical_name() == T::NAME || mapped.name == T::NAME)
            .map(SchemaDescriptor::model_key)
            .ok_or_else(|| {
                AppError::NotRegistered(format!("Model for class '{}' wasn't registered", T::NAME))
            })?;

        let handle = self.base.ioc()?.get::<ModelHandle>(&key)?;
        Ok(Model::new(handle))
    }

    /// 모델 계층을 초기화합니다. 인스턴스당 한 번만 호출할 수 있습니다.
    pub async fn init(&self) -> AppResult<()> {
        {
            let mut state = self.lock_state();
            if *state != ModelState::Uninitialized {
                return Err(AppError::AlreadyInitialized("Can't call model init twice".to_string()));
            }
            *state = ModelState::Connecting;
        }

        match self.run_init().await {
            Ok(()) => {
                self.set_state(ModelState::Ready);
                if self.base.logger.is_debug() {
                    self.store.set_query_logging(true);
                }
                Ok(())
            }
            Err(e) => {
                self.base
                    .logger
                    .error(format_args!("Error while initializing models: {}", e));
                self.set_state(ModelState::Failed);
                Err(e)
            }
        }
    }

    async fn run_init(&self) -> AppResult<()> {
        let logger = &self.base.logger;
        let ioc = self.base.ioc()?;
        print_boxed_title("MODEL INITIALIZATION");

        print_step_start(1, "Discovering schemas");
        let schemas = self.discovery.discover_schemas()?;
        if self.config.auto_register_models {
            let mut mapping = self.lock_mapping();
            for descriptor in &schemas {
                let name = descriptor.logical_name();
                if !mapping.iter().any(|mapped| mapped.logical_name() == name) {
                    mapping.push(descriptor.clone());
                }
            }
        }
        print_step_complete(1, "Schemas discovered", schemas.len());

        print_step_start(2, "Validating repository units");
        let repositories = self.discovery.discover_repositories()?;
        self.bind_model_handles(&ioc)?;
        print_step_complete(2, "Repository units validated", repositories.len());

        print_step_start(3, "Connecting to document store");
        let options = self.config.connect_options();
        if options.read_preference == ReadPreferenceMode::SecondaryPreferred {
            logger.info(format_args!("set MongoDB default readPreference to secondaryPreferred"));
        }
        self.store.connect(&self.config.mongo_uri, &options).await?;

        let this = self.this.clone();
        self.base.finalizer.add_finalizer(&self.owner, move || async move {
            match this.upgrade() {
                Some(manager) => manager.release().await,
                None => Ok(()),
            }
        })?;

        self.set_state(ModelState::DiscoveringSchemas);
        try_join(
            self.bind_repositories(&ioc, &repositories),
            self.bind_schemas(&ioc, &schemas),
        )
        .await?;

        self.set_state(ModelState::BindingModels);
        let handles = self
            .lock_mapping()
            .iter()
            .map(|descriptor| descriptor.model_key())
            .collect::<Vec<_>>()
            .into_iter()
            .map(|key| ioc.get::<ModelHandle>(&key))
            .collect::<AppResult<Vec<_>>>()?;
        print_step_complete(3, "Models bound", handles.len());

        self.set_state(ModelState::BuildingIndexes);
        let sync = self.config.sync_indexes;
        let message = format!(
            "Initialize collections and {} indexes",
            if sync { "sync" } else { "create" }
        );
        logger.info(format_args!("{}", message));
        print_step_start(4, &message);

        let summary: Vec<(String, String)> = handles
            .iter()
            .map(|handle| (handle.descriptor().model_key(), handle.collection_name().to_string()))
            .collect();

        let mut tasks: FuturesUnordered<_> = handles
            .into_iter()
            .map(|handle| {
                tokio::spawn(async move {
                    handle.init().await?;
                    if sync {
                        handle.sync_indexes().await?;
                    }
                    Ok::<_, AppError>(handle.descriptor().model_key())
                })
            })
            .collect();

        // 첫 실패에서 반환하며, 남은 태스크는 취소하지 않습니다.
        while let Some(joined) = tasks.next().await {
            let name = joined.context("Index task failed")??;
            logger.debug(format_args!("initialized {}", name));
        }

        logger.info(format_args!("{}: finished", message));
        print_step_complete(4, "Collections initialized", summary.len());
        print_model_summary(&summary, repositories.len(), sync);
        Ok(())
    }

    /// 매핑된 스키마마다 지연 생성되는 모델 핸들을 바인딩합니다.
    fn bind_model_handles(&self, ioc: &Arc<Container>) -> AppResult<()> {
        for descriptor in self.lock_mapping().iter() {
            let key = descriptor.model_key();
            if ioc.is_bound(&key) {
                continue;
            }
            let descriptor = descriptor.clone();
            let store = self.store.clone();
            let logger = self.base.logger.clone();
            let label = key.clone();
            ioc.bind_factory(&key, Lifetime::Singleton, move |_: &Arc<Container>| {
                logger.debug(format_args!("construct model for {}", label));
                let collection = store.collection(descriptor.collection)?;
                Ok(Arc::new(ModelHandle::new(descriptor.clone(), collection)) as Instance)
            })?;
        }
        Ok(())
    }

    async fn bind_repositories(&self, ioc: &Container, repositories: &[RepositoryDescriptor]) -> AppResult<()> {
        self.base.logger.debug(format_args!("Loading repositories"));
        for repository in repositories {
            if ioc.is_bound(repository.id) {
                return Err(AppError::DiscoveryError(format!(
                    "Repo {} is already bound",
                    repository.id
                )));
            }
            let constructor = repository.constructor;
            ioc.bind_factory(repository.id, Lifetime::Singleton, move |ioc: &Arc<Container>| {
                constructor(ioc)
            })?;
        }
        self.base.logger.debug(format_args!("Loading repositories finished"));
        Ok(())
    }

    async fn bind_schemas(&self, ioc: &Container, schemas: &[SchemaDescriptor]) -> AppResult<()> {
        self.base.logger.debug(format_args!("Loading schemas"));
        for schema in schemas {
            if ioc.is_bound(schema.name) {
                return Err(AppError::DiscoveryError(format!(
                    "Model {} is already bound",
                    schema.name
                )));
            }
            ioc.bind_constant(schema.name, Arc::new(schema.clone()))?;
        }
        self.base.logger.debug(format_args!("Loading schemas finished"));
        Ok(())
    }

    /// `Ready` 상태에서만 finalizer를 해제하고 연결을 끊습니다. 그 밖의 상태에서는 아무것도 하지 않습니다.
    ///
    /// 연결 해제가 실패해도 finalizer는 이미 해제된 상태입니다.
    pub async fn close(&self) -> AppResult<()> {
        {
            let mut state = self.lock_state();
            if *state != ModelState::Ready {
                return Ok(());
            }
            *state = ModelState::Closed;
        }

        self.base.finalizer.remove_finalizer(&self.owner);
        self.store.disconnect().await?;
        self.base.logger.info(format_args!("Models closed"));
        Ok(())
    }

    /// finalizer 작업. 초기화 도중 실패해 남은 연결도 정리합니다.
    async fn release(&self) -> AppResult<()> {
        if self.state() == ModelState::Ready {
            return self.close().await;
        }
        if self.store.is_connected() {
            self.store.disconnect().await?;
        }
        Ok(())
    }

    fn set_state(&self, state: ModelState) {
        let mut current = self.lock_state();
        self.base
            .logger
            .debug(format_args!("Model state {} -> {}", *current, state));
        *current = state;
    }

    fn lock_state(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_mapping(&self) -> MutexGuard<'_, Vec<SchemaDescriptor>> {
        self.mapping.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn model_component(ioc: &Arc<Container>) -> AppResult<Instance> {
    Ok(ModelManager::new(ioc, Discovery::collected())?)
}

inventory::submit! {
    ComponentRegistration { name: ModelManager::ID, constructor: model_component }
}
