//! 실행 환경 설정 관리 모듈
//!
//! 환경 이름을 감지하고, 환경별 설정 레이어를 찾을 디렉터리를 결정합니다.

use std::env;
use std::path::PathBuf;

/// 환경 이름을 지정하지 않았을 때 사용하는 기본값
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// 애플리케이션 실행 환경
///
/// 환경 이름은 환경별 설정 레이어(`<name>.json`)를 선택하는 데 사용됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// 개발 환경 - 빠른 개발을 위한 설정
    Development,
    /// 테스트 환경 - 인메모리 저장소를 사용하는 설정
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경
    Production,
    /// 그 밖의 사용자 정의 환경 (디스크의 레이어 파일만 사용)
    Custom(String),
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 또는 `NODE_ENV` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `development`를 기본값으로 사용합니다.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let env = Environment::current();
    /// let layers = load_layers(&env)?;
    /// ```
    pub fn current() -> Self {
        let name = env::var("ENVIRONMENT")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
        Self::from_name(&name)
    }

    /// 문자열에서 Environment를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `s` - 환경 이름 문자열 (대소문자 무관)
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            other => Environment::Custom(other.to_string()),
        }
    }

    /// 레이어 파일 이름으로 사용되는 정규화된 환경 이름
    pub fn name(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Custom(name) => name,
        }
    }
}

/// 디스크에서 설정 레이어를 읽을 디렉터리
///
/// `CONFIG_DIR`이 설정된 경우에만 값을 반환합니다. 설정되지 않으면
/// 바이너리에 내장된 레이어만 사용합니다.
pub fn config_dir() -> Option<PathBuf> {
    env::var("CONFIG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}
