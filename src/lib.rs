//! CMS 백엔드
//!
//! 의존성 주입 컨테이너로 로거, 설정, 종료 작업 레지스트리, MongoDB 모델 계층을
//! 구성하고 게시글(Post) 리포지토리를 제공하는 백엔드 스캐폴드입니다.
//!
//! # Features
//!
//! - **레이어 설정**: base → default → 환경별 JSON 레이어 병합
//! - **DI 컨테이너**: `inventory` 기반 컴포넌트 등록, 싱글톤/트랜지언트 수명
//! - **모델 생명주기**: 스키마/리포지토리 디스커버리, 연결, 인덱스 생성
//! - **정리 보장**: 초기화 실패와 종료 시 등록된 정리 작업 실행
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Repositories   │ ← PostRepo
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Models      │ ← ModelManager, Model<T>
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  DocumentStore  │ ← MongoStore / MemoryStore
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use cms_backend::config::{load_layers, Environment};
//! use cms_backend::core::{finalize, init_system};
//! use cms_backend::repositories::posts::PostRepo;
//!
//! let ioc = init_system(&load_layers(&Environment::current())?).await?;
//! let post = ioc.resolve::<PostRepo>()?.create(&PostDoc::with_title("hello")).await?;
//! finalize(&ioc).await?;
//! ```

pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod utils;
