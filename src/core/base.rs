//! 컴포넌트 공통 의존성
//!
//! 상태를 가진 컴포넌트가 공통으로 사용하는 Logger, ConfigManager, Finalizer와
//! 컨테이너 참조를 묶어 둡니다. 컨테이너는 약한 참조로 보관하여 컨테이너가 캐시한
//! 싱글톤과 순환 참조가 생기지 않게 합니다.

use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::config_manager::ConfigManager;
use crate::core::finalizer::Finalizer;
use crate::core::logger::Logger;
use crate::core::registry::Container;
use crate::errors::{AppError, AppResult};

pub struct ComponentBase {
    name: &'static str,
    ioc: Weak<Container>,
    pub logger: Arc<Logger>,
    pub config_manager: Arc<ConfigManager>,
    pub finalizer: Arc<Finalizer>,
}

impl ComponentBase {
    /// `name`은 설정 레코드를 찾을 때 쓰는 컴포넌트 식별자입니다.
    pub fn new(ioc: &Arc<Container>, name: &'static str) -> AppResult<Self> {
        Ok(Self {
            name,
            ioc: Arc::downgrade(ioc),
            logger: ioc.resolve::<Logger>()?,
            config_manager: ioc.resolve::<ConfigManager>()?,
            finalizer: ioc.resolve::<Finalizer>()?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ioc(&self) -> AppResult<Arc<Container>> {
        self.ioc
            .upgrade()
            .ok_or_else(|| AppError::InternalError("Container was dropped".to_string()))
    }

    pub fn config(&self) -> Map<String, Value> {
        self.config_manager.get_config(self.name)
    }

    pub fn typed_config<T: DeserializeOwned>(&self) -> AppResult<T> {
        self.config_manager.get_typed(self.name)
    }
}
