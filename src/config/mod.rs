//! # Configuration Module
//!
//! 컨테이너가 사용할 선언적 컴포넌트 설정을 관리하는 모듈입니다.
//! Spring의 `application.yml` + Profile 조합과 유사하게, 여러 레이어를 순서대로
//! 병합하여 최종 설정을 만듭니다.
//!
//! ## 모듈 구성
//!
//! - [`data_config`] - 실행 환경 감지 (`ENVIRONMENT`, `NODE_ENV`)
//! - [`ioc_config`] - 컴포넌트 선언 모델과 레이어 병합 규칙
//! - [`layers`] - base/default/환경별 레이어 로딩
//! - [`config_manager`] - 컴포넌트별 설정 조회
//!
//! ## 레이어 순서
//!
//! ```text
//! base (Logger, ConfigManager, Finalizer)
//!   └─ default.json (DocumentStore, Model)
//!        └─ <environment>.json
//! ```
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! # 필수: MongoDB 연결 URI (default 레이어의 ${MONGODB_URI})
//! export MONGODB_URI="mongodb://localhost:27017/cms"
//!
//! # 선택: 환경 이름 (기본값 development)
//! export ENVIRONMENT="production"
//!
//! # 선택: 디스크의 레이어 파일 디렉터리
//! export CONFIG_DIR="./config"
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::config::{load_layers, merge_layers, Environment};
//!
//! let layers = load_layers(&Environment::current())?;
//! let config = merge_layers(&layers)?;
//! ```

pub mod config_manager;
pub mod data_config;
pub mod ioc_config;
pub mod layers;

pub use config_manager::ConfigManager;
pub use data_config::Environment;
pub use ioc_config::{merge_layers, ConfigLayer, IocClassConfig, IocConfig};
pub use layers::{base_layer, load_layers};
