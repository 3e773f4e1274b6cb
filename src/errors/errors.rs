//! 애플리케이션 전역에서 사용하는 에러 시스템
//!
//! 부트스트랩, 컨테이너, 모델 계층에서 발생하는 모든 에러를 하나의 열거형으로 통합합니다.
//! `thiserror`를 사용하여 타입 안전하고 일관된 에러 처리를 제공합니다.
//!
//! ## 에러 분류
//!
//! | AppError | 발생 위치 |
//! |----------|-----------|
//! | `ConfigurationError` | 중복 식별자, 필수 설정 누락, 알 수 없는 구현체 |
//! | `AlreadyInitialized` | `Model::init` 두 번째 호출 |
//! | `NotRegistered` | 등록되지 않은 모델 조회 |
//! | `NotFound` | 리포지토리 조회 실패 |
//! | `ConnectionError` | 문서 저장소 연결 실패 |
//! | `IndexBuildError` | 컬렉션별 인덱스 생성 실패 |
//! | `DiscoveryError` | 스키마/리포지토리 유닛 검증 실패 |
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::errors::AppError;
//!
//! fn find_component(name: &str) -> Result<(), AppError> {
//!     Err(AppError::ConfigurationError(format!("Unknown component '{}'", name)))
//! }
//! ```

use thiserror::Error;

/// 애플리케이션 전역 에러 타입
///
/// 모든 에러는 발생한 생명주기 단계에 치명적이며, 재시도는 수행하지 않습니다.
/// 유일한 예외는 존재하지 않는 finalizer 제거로, 이 경우 로그만 남깁니다.
#[derive(Error, Debug)]
pub enum AppError {
    /// 설정 에러 (중복 식별자, 필수 키 누락, 해석할 수 없는 구현체)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 한 번만 허용되는 초기화를 다시 시도한 경우
    #[error("Already initialized: {0}")]
    AlreadyInitialized(String),

    /// 컨테이너나 모델 매핑에 등록되지 않은 대상을 조회한 경우
    #[error("Not registered: {0}")]
    NotRegistered(String),

    /// 리소스 찾을 수 없음 에러
    #[error("Not found: {0}")]
    NotFound(String),

    /// 문서 저장소 연결 실패
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// 컬렉션 초기화 또는 인덱스 생성 실패
    #[error("Error while initializing collection '{collection}': {message}")]
    IndexBuildError {
        collection: String,
        message: String,
    },

    /// 디스커버리 유닛 검증 실패 (리포지토리 0개/2개 이상, 중복 스키마 이름)
    #[error("Discovery error: {0}")]
    DiscoveryError(String),

    /// 데이터베이스 관련 에러
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 입력값 검증 에러
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 하나 이상의 finalizer 실행 실패
    #[error("Finalization error: {0}")]
    FinalizationError(String),

    /// 내부 에러
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 AppError로 변환하는 확장 trait
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;

    /// 클로저를 사용하여 지연 평가된 컨텍스트를 제공합니다.
    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", f(), e)))
    }
}
