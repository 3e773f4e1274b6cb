//! 데이터 액세스 계층을 담당하는 리포지토리 모듈
//!
//! 리포지토리는 생성 시점에 모델 관리자에서 자신의 모델 핸들을 한 번 받아 보관합니다.
//! 각 리포지토리 모듈은 [`crate::models::discovery::RepositoryUnit`]을 정확히 하나
//! 제출하고, 모델 초기화 단계에서 컨테이너에 싱글톤으로 바인딩됩니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::repositories::posts::PostRepo;
//!
//! let post_repo = ioc.resolve::<PostRepo>()?;
//! let post = post_repo.get(&id, GetOptions::default()).await?;
//! ```

pub mod base_repo;
pub mod posts;

pub use base_repo::GetOptions;
