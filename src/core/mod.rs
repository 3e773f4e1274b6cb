//! # Core Framework Module
//!
//! 애플리케이션 생명주기를 구성하는 핵심 컴포넌트들입니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 의존성 주입 컨테이너
//! - **Container**: Spring의 ApplicationContext 역할, 프로세스당 하나
//! - **컴포넌트 등록**: `inventory` 기반 컴파일 타임 팩토리 수집
//! - **수명 관리**: 싱글톤(기본)과 트랜지언트, 지연 생성
//!
//! ### [`logger`] - 레벨 필터 로거
//! - 설정 레코드의 `level`로 최소 레벨 결정
//! - 실제 출력은 `env_logger`
//!
//! ### [`finalizer`] - 종료 작업 레지스트리
//! - 소유자별 비동기 정리 작업, 역순 실행
//!
//! ### [`base`] - 컴포넌트 공통 의존성
//!
//! ### [`init`] - 시스템 부트스트랩
//!
//! ## Spring Framework와의 비교
//!
//! | Spring | 이 프레임워크 |
//! |--------|---------------|
//! | `ApplicationContext` | `Container` |
//! | `@Component` | `ComponentRegistration` + `inventory::submit!` |
//! | `@Scope` | `Lifetime::{Singleton, Transient}` |
//! | `DisposableBean` | `Finalizer::add_finalizer` |
//! | `SpringApplication.run` | `init_system` |
//!
//! ## 부트스트랩 흐름
//!
//! ```text
//! ConfigLayer[] ─merge─▶ IocConfig ─▶ Container
//!                                        │
//!                                        ├─ Logger / ConfigManager / Finalizer
//!                                        ├─ DocumentStore
//!                                        └─ Model ─init()─▶ Ready
//!                                              │
//!                                              └─ 실패 시 Finalizer::finalize()
//! ```

pub mod base;
pub mod finalizer;
pub mod init;
pub mod logger;
pub mod registry;

pub use finalizer::{Finalizer, OwnerId};
pub use init::{finalize, init_system, init_system_with_config};
pub use logger::{init_logging, Logger};
pub use registry::{Component, Container, Lifetime};
