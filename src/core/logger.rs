//! # Logger 컴포넌트
//!
//! `log` 크레이트 매크로를 감싸는 얇은 컴포넌트입니다. 실제 출력은 프로세스 시작 시
//! [`init_logging`]으로 설치한 `env_logger`가 담당합니다.
//!
//! 설정 레코드의 `level` 키로 이 컴포넌트가 통과시킬 최소 레벨을 정합니다.
//!
//! ```json
//! { "class": "Logger", "config": { "level": "debug" } }
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use log::{Level, LevelFilter};
use serde::Deserialize;

use crate::config::config_manager::ConfigManager;
use crate::core::registry::{Component, ComponentRegistration, Container, Instance};
use crate::errors::{AppError, AppResult};

const LOG_TARGET: &str = "cms_backend";

#[derive(Debug, Deserialize)]
struct LoggerConfig {
    #[serde(default = "default_level")]
    level: String,
}

fn default_level() -> String {
    "info".to_string()
}

/// 레벨 필터가 적용되는 로거
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
}

impl Component for Logger {
    const ID: &'static str = "Logger";
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// `ConfigManager`의 Logger 레코드로 생성합니다.
    ///
    /// # Errors
    ///
    /// 알 수 없는 레벨 문자열은 `ConfigurationError`입니다.
    pub fn from_config(config_manager: &ConfigManager) -> AppResult<Self> {
        let config: LoggerConfig = config_manager.get_typed(Self::ID)?;
        let level = LevelFilter::from_str(&config.level).map_err(|_| {
            AppError::ConfigurationError(format!("Unknown log level '{}'", config.level))
        })?;
        Ok(Self::new(level))
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn is_debug(&self) -> bool {
        self.level >= LevelFilter::Debug
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: LOG_TARGET, level, "{}", args);
        }
    }
}

fn logger_component(ioc: &Arc<Container>) -> AppResult<Instance> {
    let config_manager = ioc.resolve::<ConfigManager>()?;
    Ok(Arc::new(Logger::from_config(&config_manager)?))
}

inventory::submit! {
    ComponentRegistration { name: Logger::ID, constructor: logger_component }
}

/// 프로세스 전역 로거(`env_logger`)를 설치합니다.
///
/// `RUST_LOG`가 설정되어 있으면 그 값이 우선합니다. 이미 설치되어 있으면 무시합니다.
pub fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:<5}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ioc_config::{IocClassConfig, IocConfig};
    use serde_json::json;

    fn manager(config: Option<serde_json::Value>) -> ConfigManager {
        let mut class = IocClassConfig::new(Logger::ID);
        class.config = config;
        ConfigManager::new(&IocConfig { classes: vec![class] }).unwrap()
    }

    #[test]
    fn test_level_defaults_to_info() {
        let logger = Logger::from_config(&manager(None)).unwrap();

        assert_eq!(logger.level(), LevelFilter::Info);
        assert!(!logger.is_debug());
        assert!(logger.enabled(Level::Warn));
        assert!(!logger.enabled(Level::Debug));
    }

    #[test]
    fn test_level_is_read_from_config() {
        let logger = Logger::from_config(&manager(Some(json!({ "level": "debug" })))).unwrap();

        assert!(logger.is_debug());
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let result = Logger::from_config(&manager(Some(json!({ "level": "loud" }))));

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_logger_resolves_from_container() {
        let ioc = Container::from_config(IocConfig {
            classes: vec![
                IocClassConfig::new(Logger::ID).with_config(json!({ "level": "warn" })),
                IocClassConfig::new(ConfigManager::ID),
            ],
        })
        .unwrap();

        let logger = ioc.resolve::<Logger>().unwrap();
        assert_eq!(logger.level(), LevelFilter::Warn);
    }
}
