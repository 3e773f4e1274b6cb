//! # Model Layer
//!
//! 스키마 선언, 디스커버리, 모델 핸들, 그리고 모델 계층 전체의 생명주기를 관리합니다.
//!
//! - [`schema`] - `Schema` 트레이트와 설명자
//! - [`discovery`] - 컴파일 타임에 제출된 스키마/리포지토리 유닛
//! - [`model`] - 컬렉션 작업 핸들
//! - [`model_base`] - 초기화 상태 기계 (`ModelManager`)

pub mod discovery;
pub mod model;
pub mod model_base;
pub mod schema;

pub use discovery::{Discovery, Repository, RepositoryDescriptor, RepositoryUnit, SchemaUnit};
pub use model::{Model, ModelHandle};
pub use model_base::{ModelConfig, ModelManager, ModelState};
pub use schema::{Schema, SchemaDescriptor};
