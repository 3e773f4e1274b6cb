//! 스키마 정의
//!
//! 문서 타입은 [`Schema`]를 구현하여 논리 이름, 컬렉션, 인덱스를 선언합니다.
//! 디스커버리는 타입 정보 대신 [`SchemaDescriptor`] 값을 다룹니다.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::IndexSpec;

/// 컬렉션에 저장되는 문서 타입
pub trait Schema: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 논리 이름 (중복 등록 검사 키)
    const NAME: &'static str;
    const COLLECTION: &'static str;
    /// `createdAt`/`updatedAt` 자동 기록 여부
    const TIMESTAMPS: bool = false;

    fn indexes() -> Vec<IndexSpec> {
        Vec::new()
    }
}

/// 스키마 설명자
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub collection: &'static str,
    pub timestamps: bool,
    pub indexes: fn() -> Vec<IndexSpec>,
    /// 기반 스키마 이름으로 등록되는 구현 스키마인 경우 그 기반 이름
    pub overrides: Option<&'static str>,
}

impl SchemaDescriptor {
    pub fn of<T: Schema>() -> Self {
        Self {
            name: T::NAME,
            collection: T::COLLECTION,
            timestamps: T::TIMESTAMPS,
            indexes: T::indexes,
            overrides: None,
        }
    }

    /// `base` 스키마 자리에 등록되는 구현 스키마
    pub fn overriding<T: Schema>(base: &'static str) -> Self {
        Self {
            overrides: Some(base),
            ..Self::of::<T>()
        }
    }

    /// 매핑 키 (기반 스키마 이름이 있으면 그 이름)
    pub fn logical_name(&self) -> &'static str {
        self.overrides.unwrap_or(self.name)
    }

    /// 컨테이너 바인딩 식별자
    pub fn model_key(&self) -> String {
        model_key(self.logical_name())
    }
}

pub fn model_key(name: &str) -> String {
    format!("model.{}", name)
}
