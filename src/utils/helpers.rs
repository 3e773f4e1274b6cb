//! # 공통 헬퍼
//!
//! 환경 변수 조회와 ObjectId 변환처럼 여러 계층에서 쓰이는 작은 함수들입니다.

use std::env;

use mongodb::bson::oid::ObjectId;

use crate::errors::{AppError, AppResult};

/// 필수 환경 변수를 읽습니다.
///
/// # Errors
///
/// 변수가 설정되지 않은 경우 `ConfigurationError`를 반환합니다.
///
/// # 예제
///
/// ```rust,ignore
/// let uri = get_env("MONGODB_URI")?;
/// ```
pub fn get_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| {
        AppError::ConfigurationError(format!("Environment variable '{}' isn't defined", name))
    })
}

/// 16진수 문자열을 ObjectId로 변환합니다.
pub fn to_object_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id.trim())
        .map_err(|_| AppError::ValidationError(format!("Wrong ObjectId: {}", id)))
}

/// 비어 있을 수 있는 id 문자열을 변환합니다. 빈 문자열과 `None`은 `None`입니다.
pub fn to_object_id_opt(id: Option<&str>) -> AppResult<Option<ObjectId>> {
    match id.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => to_object_id(id).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_object_id_accepts_hex() {
        let id = ObjectId::new();

        assert_eq!(to_object_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn test_to_object_id_rejects_garbage() {
        assert!(matches!(
            to_object_id("not-an-id"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_to_object_id_opt() {
        assert_eq!(to_object_id_opt(None).unwrap(), None);
        assert_eq!(to_object_id_opt(Some("  ")).unwrap(), None);
        assert!(to_object_id_opt(Some("507f1f77bcf86cd799439011")).unwrap().is_some());
    }

    #[test]
    fn test_get_env_missing() {
        assert!(matches!(
            get_env("CMS_TEST_SURELY_UNSET_VAR"),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
