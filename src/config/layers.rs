//! 설정 레이어 로딩
//!
//! base 레이어는 코드에 고정되어 있고, default/환경별 레이어는 바이너리에 내장된
//! JSON 파일을 사용합니다. `CONFIG_DIR`이 지정되면 같은 이름의 파일을 디스크에서
//! 먼저 찾습니다.

use std::fs;

use log::debug;
use serde_json::json;

use crate::config::config_manager::ConfigManager;
use crate::config::data_config::{config_dir, Environment};
use crate::config::ioc_config::ConfigLayer;
use crate::core::finalizer::Finalizer;
use crate::core::logger::Logger;
use crate::core::registry::Component;
use crate::errors::{AppError, AppResult};

const DEFAULT_LAYER: &str = include_str!("layers/default.json");
const DEVELOPMENT_LAYER: &str = include_str!("layers/development.json");
const TEST_LAYER: &str = include_str!("layers/test.json");

/// 인프라 컴포넌트(Logger, ConfigManager, Finalizer)를 선언하는 base 레이어
pub fn base_layer() -> ConfigLayer {
    ConfigLayer::new(
        "base",
        json!({
            "classes": [
                { "class": Logger::ID },
                { "class": ConfigManager::ID },
                { "class": Finalizer::ID }
            ]
        }),
    )
}

/// base → default → environment 순서의 레이어 목록을 만듭니다.
///
/// 환경별 레이어가 없으면 건너뜁니다.
pub fn load_layers(environment: &Environment) -> AppResult<Vec<ConfigLayer>> {
    let mut layers = vec![base_layer(), load_named_layer("default")?.ok_or_else(|| {
        AppError::ConfigurationError("Default config layer is missing".to_string())
    })?];

    match load_named_layer(environment.name())? {
        Some(layer) => layers.push(layer),
        None => debug!("No config layer for environment '{}'", environment.name()),
    }

    Ok(layers)
}

fn load_named_layer(name: &str) -> AppResult<Option<ConfigLayer>> {
    if let Some(dir) = config_dir() {
        let path = dir.join(format!("{}.json", name));
        if path.is_file() {
            debug!("Loading config layer from {}", path.display());
            let text = fs::read_to_string(&path).map_err(|e| {
                AppError::ConfigurationError(format!("Can't read {}: {}", path.display(), e))
            })?;
            return ConfigLayer::from_json(name, &text).map(Some);
        }
    }

    embedded_layer(name)
        .map(|text| ConfigLayer::from_json(name, text))
        .transpose()
}

fn embedded_layer(name: &str) -> Option<&'static str> {
    match name {
        "default" => Some(DEFAULT_LAYER),
        "development" => Some(DEVELOPMENT_LAYER),
        "test" => Some(TEST_LAYER),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ioc_config::merge_layers;

    #[test]
    fn test_embedded_layers_parse() {
        for name in ["default", "development", "test"] {
            assert!(load_named_layer(name).unwrap().is_some(), "layer {}", name);
        }
    }

    #[test]
    fn test_unknown_environment_has_no_layer() {
        let layers = load_layers(&Environment::Custom("no-such-env".to_string())).unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "base");
        assert_eq!(layers[1].name, "default");
    }

    #[test]
    fn test_test_environment_selects_memory_store() {
        let layers = load_layers(&Environment::Test).unwrap();
        let config = merge_layers(&layers).unwrap();

        let store = config.find("DocumentStore").unwrap();
        assert_eq!(store.implementation_name(), "MemoryStore");
        assert_eq!(config.classes[0].class, "Logger");
        assert!(config.is_debug());
    }
}
