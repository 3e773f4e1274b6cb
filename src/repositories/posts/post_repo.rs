//! # 게시글 리포지토리
//!
//! `post` 컬렉션의 생성과 단건 조회를 담당합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::repositories::{posts::PostRepo, GetOptions};
//!
//! let repo = ioc.resolve::<PostRepo>()?;
//! let post = repo.create(&PostDoc::with_title("test post")).await?;
//!
//! // 결과가 없으면 NotFound
//! let same = repo.get(&post.id.unwrap(), GetOptions::default()).await?;
//!
//! // 결과가 없으면 None
//! let maybe = repo.get(&other_id, GetOptions::no_throw()).await?;
//! ```

use std::sync::Arc;

use mongodb::bson::{doc, oid::ObjectId};

use crate::core::registry::{Component, Container};
use crate::domain::entities::posts::PostDoc;
use crate::errors::AppResult;
use crate::models::discovery::{Repository, RepositoryDescriptor, RepositoryUnit};
use crate::models::model::Model;
use crate::models::model_base::ModelManager;
use crate::repositories::base_repo::{find_one_by_query, GetOptions};

/// 게시글 데이터 액세스 리포지토리
pub struct PostRepo {
    model: Model<PostDoc>,
}

impl Component for PostRepo {
    const ID: &'static str = "PostRepo";
}

impl Repository for PostRepo {
    fn construct(ioc: &Arc<Container>) -> AppResult<Self> {
        let model = ioc.resolve::<ModelManager>()?.get_model::<PostDoc>()?;
        Ok(Self { model })
    }
}

impl PostRepo {
    /// id로 게시글을 조회합니다.
    ///
    /// # Errors
    ///
    /// 게시글이 없고 `options.no_throw`가 꺼져 있으면 `NotFound`입니다.
    pub async fn get(&self, id: &ObjectId, options: GetOptions) -> AppResult<Option<PostDoc>> {
        find_one_by_query(&self.model, doc! { "_id": *id }, options).await
    }

    /// 게시글을 저장하고 `_id`와 생성/수정 시각이 채워진 문서를 반환합니다.
    pub async fn create(&self, post: &PostDoc) -> AppResult<PostDoc> {
        self.model.create(post).await
    }
}

fn post_repositories() -> Vec<RepositoryDescriptor> {
    vec![RepositoryDescriptor::of::<PostRepo>()]
}

inventory::submit! {
    RepositoryUnit { source: "repositories::posts", repositories: post_repositories }
}
