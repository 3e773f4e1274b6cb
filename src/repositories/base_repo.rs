//! 리포지토리 공통 조회
//!
//! 단건 조회는 기본적으로 결과가 없으면 `NotFound`를 반환하고, `no_throw`가 켜진
//! 경우에만 `None`을 돌려줍니다.

use mongodb::bson::Document;

use crate::errors::{AppError, AppResult};
use crate::models::model::Model;
use crate::models::schema::Schema;

/// 단건 조회 옵션
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// 결과가 없을 때 에러 대신 `None`을 반환
    pub no_throw: bool,
    /// 포함할 필드 (`{ "title": 1 }` 형태)
    pub projection: Option<Document>,
}

impl GetOptions {
    pub fn no_throw() -> Self {
        Self {
            no_throw: true,
            ..Self::default()
        }
    }

    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// 쿼리로 문서 하나를 찾습니다.
///
/// # Errors
///
/// 문서가 없고 `no_throw`가 꺼져 있으면 `NotFound`입니다.
pub async fn find_one_by_query<T: Schema>(
    model: &Model<T>,
    query: Document,
    options: GetOptions,
) -> AppResult<Option<T>> {
    let found = model.find_one(query.clone(), options.projection).await?;
    if found.is_none() && !options.no_throw {
        return Err(AppError::NotFound(format!("Can't find {} by {}", T::NAME, query)));
    }
    Ok(found)
}
