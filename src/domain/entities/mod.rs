//! # Domain Entities Module
//!
//! MongoDB 문서와 직접 매핑되는 엔티티들입니다.
//!
//! ## 엔티티 규칙
//!
//! - `_id`는 `Option<ObjectId>`로 두고 저장 전에는 직렬화하지 않습니다
//! - 필드 이름은 컬렉션의 camelCase 키를 그대로 사용합니다
//! - `Schema::TIMESTAMPS`가 켜진 엔티티는 `createdAt`/`updatedAt`을 모델이 채웁니다
//!
//! ```text
//! entities/
//! ├── mod.rs
//! └── posts/
//!     ├── mod.rs
//!     └── post.rs   ← PostDoc (collection: post)
//! ```

pub mod posts;

pub use posts::*;
