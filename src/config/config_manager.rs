//! 컴포넌트별 설정 레지스트리
//!
//! 병합된 [`IocConfig`]를 한 번 순회하여 식별자 → 설정 레코드 매핑을 만듭니다.
//! 설정은 추상 식별자와 구현체 식별자 양쪽 이름으로 조회할 수 있습니다.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::ioc_config::IocConfig;
use crate::core::registry::Component;
use crate::errors::{AppError, AppResult};

/// 컴포넌트 설정 조회기
///
/// 같은 식별자가 두 번 등장하면(구현체 별칭이 다른 식별자와 겹치는 경우 포함)
/// 생성 단계에서 실패합니다. 조용히 가려지는 설정을 막기 위함입니다.
#[derive(Debug, Default)]
pub struct ConfigManager {
    class_config: HashMap<String, Map<String, Value>>,
}

impl Component for ConfigManager {
    const ID: &'static str = "ConfigManager";
}

impl ConfigManager {
    pub fn new(ioc_config: &IocConfig) -> AppResult<Self> {
        let mut seen = HashSet::new();
        let mut class_config = HashMap::new();

        let mut add = |name: &str, value: Option<&Value>| -> AppResult<()> {
            if !seen.insert(name.to_string()) {
                return Err(AppError::ConfigurationError(format!(
                    "Found the second configuration for {}",
                    name
                )));
            }
            match value {
                Some(Value::Object(map)) => {
                    class_config.insert(name.to_string(), map.clone());
                }
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(AppError::ConfigurationError(format!(
                        "Configuration for {} must be an object, got {}",
                        name, other
                    )));
                }
            }
            Ok(())
        };

        for class in &ioc_config.classes {
            add(&class.class, class.config.as_ref())?;
            if let Some(implementation) = class.implementation.as_deref() {
                if implementation != class.class {
                    add(implementation, class.config.as_ref())?;
                }
            }
        }

        Ok(Self { class_config })
    }

    /// 컴포넌트의 설정 레코드를 반환합니다. 없으면 빈 레코드입니다.
    pub fn get_config(&self, name: &str) -> Map<String, Value> {
        self.class_config.get(name).cloned().unwrap_or_default()
    }

    /// 설정 레코드를 타입으로 역직렬화합니다.
    ///
    /// # Errors
    ///
    /// 필수 키 누락이나 타입 불일치는 `ConfigurationError`로 보고됩니다.
    pub fn get_typed<T: DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.get_config(name))).map_err(|e| {
            AppError::ConfigurationError(format!("Invalid configuration for {}: {}", name, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ioc_config::IocClassConfig;
    use serde::Deserialize;
    use serde_json::json;

    fn config(classes: Vec<IocClassConfig>) -> IocConfig {
        IocConfig { classes }
    }

    #[test]
    fn test_get_config_returns_record_or_empty() {
        let manager = ConfigManager::new(&config(vec![
            IocClassConfig::new("Logger").with_config(json!({ "level": "debug" })),
            IocClassConfig::new("Finalizer"),
        ]))
        .unwrap();

        assert_eq!(manager.get_config("Logger")["level"], json!("debug"));
        assert!(manager.get_config("Finalizer").is_empty());
        assert!(manager.get_config("Unknown").is_empty());
    }

    #[test]
    fn test_config_is_reachable_by_implementation_name() {
        let manager = ConfigManager::new(&config(vec![IocClassConfig::new("DocumentStore")
            .with_implementation("MemoryStore")
            .with_config(json!({ "seed": 1 }))]))
        .unwrap();

        assert_eq!(manager.get_config("MemoryStore")["seed"], json!(1));
        assert_eq!(manager.get_config("DocumentStore")["seed"], json!(1));
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let result = ConfigManager::new(&config(vec![
            IocClassConfig::new("Logger"),
            IocClassConfig::new("Logger"),
        ]));

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_implementation_alias_colliding_with_identifier_is_rejected() {
        let result = ConfigManager::new(&config(vec![
            IocClassConfig::new("MemoryStore"),
            IocClassConfig::new("DocumentStore").with_implementation("MemoryStore"),
        ]));

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_get_typed_reports_missing_field() {
        #[derive(Deserialize)]
        #[allow(dead_code)]
        struct Required {
            uri: String,
        }

        let manager = ConfigManager::new(&config(vec![IocClassConfig::new("Model")])).unwrap();

        assert!(matches!(
            manager.get_typed::<Required>("Model"),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
