//! # IoC 설정 모델과 레이어 병합
//!
//! 컨테이너가 바인딩할 컴포넌트 목록(`classes`)을 선언적으로 표현하고,
//! 여러 설정 레이어를 하나로 병합합니다.
//!
//! ## 병합 규칙
//!
//! 레이어는 base → default → environment 순서로 deep-merge 됩니다.
//!
//! - **객체**: 키 단위로 재귀 병합
//! - **class 배열**: 모든 요소가 `class` 키를 가진 객체인 배열은 `class` 값으로
//!   매칭하여 같은 자리에서 병합하고, 새 항목은 뒤에 추가합니다
//! - **그 밖의 배열과 스칼라**: 나중 레이어의 값으로 교체
//!
//! ```text
//! base:        [{ class: Logger, config: { level: info } }]
//! environment: [{ class: Logger, config: { level: debug } }]
//! ───────────────────────────────────────────────────────────
//! merged:      [{ class: Logger, config: { level: debug } }]
//! ```
//!
//! 한 레이어 안에서 같은 `class`를 두 번 선언하면 설정 에러입니다.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::logger::Logger;
use crate::core::registry::Component;
use crate::errors::{AppError, AppResult, ErrorContext};
use crate::utils::helpers::get_env;

/// 컴포넌트 하나의 선언
///
/// `class`는 컨테이너 조회 키이고, `implementation`이 지정되면 해당 이름의
/// 컴포넌트 팩토리로 인스턴스를 생성합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IocClassConfig {
    /// 추상 식별자 (컨테이너 조회 키)
    pub class: String,
    /// 구체 구현체 식별자 (생략 시 `class`와 동일)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    /// 싱글톤 여부 (생략 시 싱글톤)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleton: Option<bool>,
    /// 컴포넌트별 설정 레코드
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl IocClassConfig {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            implementation: None,
            singleton: None,
            config: None,
        }
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transient(mut self) -> Self {
        self.singleton = Some(false);
        self
    }

    /// 실제로 생성에 사용할 구현체 식별자
    pub fn implementation_name(&self) -> &str {
        self.implementation.as_deref().unwrap_or(&self.class)
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton.unwrap_or(true)
    }
}

/// 병합이 끝난 IoC 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IocConfig {
    #[serde(default)]
    pub classes: Vec<IocClassConfig>,
}

impl IocConfig {
    pub fn find(&self, class: &str) -> Option<&IocClassConfig> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Logger 설정의 `level` 값 (없으면 `info`)
    pub fn logger_level(&self) -> &str {
        self.find(Logger::ID)
            .and_then(|c| c.config.as_ref())
            .and_then(|config| config.get("level"))
            .and_then(Value::as_str)
            .unwrap_or("info")
    }

    pub fn is_debug(&self) -> bool {
        self.logger_level().eq_ignore_ascii_case("debug")
    }
}

/// 이름이 붙은 설정 레이어
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub name: String,
    pub value: Value,
}

impl ConfigLayer {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// JSON 텍스트에서 레이어를 만듭니다.
    pub fn from_json(name: impl Into<String>, text: &str) -> AppResult<Self> {
        let name = name.into();
        let value = serde_json::from_str(text).map_err(|e| {
            AppError::ConfigurationError(format!("Can't parse config layer '{}': {}", name, e))
        })?;
        Ok(Self { name, value })
    }

    pub fn from_classes(name: impl Into<String>, classes: Vec<IocClassConfig>) -> AppResult<Self> {
        let value = serde_json::to_value(IocConfig { classes }).context("Can't serialize config layer")?;
        Ok(Self::new(name, value))
    }

    /// 같은 레이어 안에서 `class`가 중복 선언되었는지 검사합니다.
    fn check_duplicates(&self) -> AppResult<()> {
        let Some(classes) = self.value.get("classes").and_then(Value::as_array) else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for class in classes.iter().filter_map(|c| c.get("class")).filter_map(Value::as_str) {
            if !seen.insert(class) {
                return Err(AppError::ConfigurationError(format!(
                    "Layer '{}' declares '{}' more than once",
                    self.name, class
                )));
            }
        }
        Ok(())
    }
}

/// 레이어들을 순서대로 병합하고 `${NAME}` 플레이스홀더를 환경 변수로 치환합니다.
///
/// # Errors
///
/// - 레이어 내 중복 `class` → `ConfigurationError`
/// - 설정되지 않은 환경 변수 참조 → `ConfigurationError`
/// - `IocConfig`로 역직렬화 실패 → `ConfigurationError`
pub fn merge_layers(layers: &[ConfigLayer]) -> AppResult<IocConfig> {
    let mut merged = merge_values(layers)?;
    expand_env(&mut merged)?;
    serde_json::from_value(merged)
        .map_err(|e| AppError::ConfigurationError(format!("Invalid IoC configuration: {}", e)))
}

/// 플레이스홀더 치환 없이 레이어를 병합한 원시 JSON 값
pub fn merge_values(layers: &[ConfigLayer]) -> AppResult<Value> {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        layer.check_duplicates()?;
        deep_merge(&mut merged, layer.value.clone(), ArrayMerge::ByClass);
    }
    Ok(merged)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ArrayMerge {
    ByClass,
    Replace,
}

fn deep_merge(target: &mut Value, source: Value, arrays: ArrayMerge) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value, arrays),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source))
            if arrays == ArrayMerge::ByClass
                && is_class_array(target.as_slice())
                && is_class_array(&source) =>
        {
            merge_class_arrays(target, source);
        }
        (target, source) => *target = source,
    }
}

fn is_class_array(items: &[Value]) -> bool {
    items
        .iter()
        .all(|item| item.get("class").is_some_and(|class| !class.is_null()))
}

fn merge_class_arrays(target: &mut Vec<Value>, source: Vec<Value>) {
    for item in source {
        let existing = target
            .iter_mut()
            .find(|candidate| candidate.get("class") == item.get("class"));
        match existing {
            // 매칭된 항목 내부의 배열은 통째로 교체
            Some(existing) => deep_merge(existing, item, ArrayMerge::Replace),
            None => target.push(item),
        }
    }
}

/// 문자열 값 전체가 `${NAME}` 형태이면 환경 변수 값으로 치환합니다.
fn expand_env(value: &mut Value) -> AppResult<()> {
    match value {
        Value::String(text) => {
            if let Some(name) = text.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
                *text = get_env(name)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter_mut().try_for_each(expand_env),
        Value::Object(map) => map.values_mut().try_for_each(expand_env),
        _ => Ok(()),
    }
}
