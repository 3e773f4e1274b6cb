//! 모델 핸들
//!
//! [`ModelHandle`]은 스키마 설명자와 컬렉션 작업을 연결하는 런타임 핸들이고,
//! [`Model<T>`]는 그 위에 문서 타입을 입힌 얇은 래퍼입니다.

use std::marker::PhantomData;
use std::sync::Arc;

use mongodb::bson::{self, Bson, DateTime, Document};

use crate::db::DocumentCollection;
use crate::errors::{AppError, AppResult};
use crate::models::schema::{Schema, SchemaDescriptor};

/// 스키마에 묶인 컬렉션 핸들
pub struct ModelHandle {
    descriptor: SchemaDescriptor,
    collection: Arc<dyn DocumentCollection>,
}

impl ModelHandle {
    pub fn new(descriptor: SchemaDescriptor, collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            descriptor,
            collection,
        }
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// 컬렉션을 만들고 인덱스 생성이 끝날 때까지 기다립니다.
    ///
    /// # Errors
    ///
    /// 모든 실패는 컬렉션 이름이 담긴 `IndexBuildError`로 보고됩니다.
    pub async fn init(&self) -> AppResult<()> {
        self.collection
            .init(&(self.descriptor.indexes)())
            .await
            .map_err(|e| self.index_error(e))
    }

    pub async fn sync_indexes(&self) -> AppResult<()> {
        self.collection
            .sync_indexes(&(self.descriptor.indexes)())
            .await
            .map_err(|e| self.index_error(e))
    }

    /// 문서를 저장하고 `_id`가 채워진 문서를 반환합니다.
    pub async fn create_document(&self, mut document: Document) -> AppResult<Document> {
        if matches!(document.get("_id"), Some(Bson::Null)) {
            document.remove("_id");
        }
        if self.descriptor.timestamps {
            let now = DateTime::now();
            document.insert("createdAt", now);
            document.insert("updatedAt", now);
        }

        let id = self.collection.insert_one(document.clone()).await?;
        document.insert("_id", id);
        Ok(document)
    }

    pub async fn find_one_document(
        &self,
        filter: Document,
        projection: Option<Document>,
    ) -> AppResult<Option<Document>> {
        self.collection.find_one(filter, projection).await
    }

    fn index_error(&self, error: AppError) -> AppError {
        match error {
            AppError::IndexBuildError { .. } => error,
            other => AppError::IndexBuildError {
                collection: self.collection.name().to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// 문서 타입이 지정된 모델
pub struct Model<T: Schema> {
    handle: Arc<ModelHandle>,
    _schema: PhantomData<fn() -> T>,
}

impl<T: Schema> Clone for Model<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _schema: PhantomData,
        }
    }
}

impl<T: Schema> Model<T> {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self {
            handle,
            _schema: PhantomData,
        }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub async fn create(&self, partial: &T) -> AppResult<T> {
        let document = bson::to_document(partial)
            .map_err(|e| AppError::ValidationError(format!("Can't serialize {}: {}", T::NAME, e)))?;
        let stored = self.handle.create_document(document).await?;
        from_document(stored)
    }

    pub async fn find_one(&self, filter: Document, projection: Option<Document>) -> AppResult<Option<T>> {
        self.handle
            .find_one_document(filter, projection)
            .await?
            .map(from_document)
            .transpose()
    }
}

fn from_document<T: Schema>(document: Document) -> AppResult<T> {
    bson::from_document(document)
        .map_err(|e| AppError::DatabaseError(format!("Can't deserialize {}: {}", T::NAME, e)))
}
