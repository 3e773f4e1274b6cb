//! # Domain Layer Module
//!
//! 컬렉션에 저장되는 문서 타입을 정의합니다.
//!
//! ```text
//! Domain Layer (이 모듈)
//! └── Entities  - 컬렉션 문서 (Schema 구현)
//!      │
//!      ▼
//! Repositories  - 모델 핸들을 통한 데이터 액세스
//!      │
//!      ▼
//! Models / DocumentStore
//! ```
//!
//! 각 엔티티 모듈은 [`crate::models::discovery::SchemaUnit`]을 제출하여 모델
//! 초기화 시 자동으로 발견됩니다.

pub mod entities;

pub use entities::*;
