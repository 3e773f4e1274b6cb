//! 시스템 부트스트랩
//!
//! 컨테이너를 만들고 모델 계층을 초기화합니다. 초기화가 실패하면 그때까지 등록된
//! 종료 작업을 모두 실행한 뒤 원래 에러를 반환합니다.
//!
//! ```rust,ignore
//! let ioc = init_system(&load_layers(&Environment::current())?).await?;
//! let posts = ioc.resolve::<PostRepo>()?;
//! // ...
//! finalize(&ioc).await?;
//! ```

use std::sync::Arc;

use log::{error, info};

use crate::config::ioc_config::{merge_layers, ConfigLayer, IocConfig};
use crate::core::finalizer::Finalizer;
use crate::core::registry::Container;
use crate::errors::AppResult;
use crate::models::model_base::ModelManager;

/// 설정 레이어로 시스템을 초기화합니다.
pub async fn init_system(layers: &[ConfigLayer]) -> AppResult<Arc<Container>> {
    init_system_with_config(merge_layers(layers)?).await
}

/// 병합된 설정으로 시스템을 초기화합니다.
pub async fn init_system_with_config(config: IocConfig) -> AppResult<Arc<Container>> {
    let ioc = Container::from_config(config)?;
    let model = ioc.resolve::<ModelManager>()?;

    if let Err(e) = model.init().await {
        if let Err(finalize_error) = finalize(&ioc).await {
            error!("Cleanup after failed init also failed: {}", finalize_error);
        }
        return Err(e);
    }

    info!("✅ System initialized");
    Ok(ioc)
}

/// 등록된 모든 종료 작업을 실행합니다. 여러 번 호출해도 안전합니다.
pub async fn finalize(ioc: &Container) -> AppResult<()> {
    ioc.resolve::<Finalizer>()?.finalize(&[]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::data_config::Environment;
    use crate::config::layers::load_layers;
    use crate::db::resolve_store;
    use crate::domain::entities::posts::PostDoc;
    use crate::errors::AppError;
    use crate::repositories::{posts::PostRepo, GetOptions};
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    fn test_layers(extra: Option<serde_json::Value>) -> Vec<ConfigLayer> {
        let mut layers = load_layers(&Environment::Test).unwrap();
        if let Some(extra) = extra {
            layers.push(ConfigLayer::new("override", extra));
        }
        layers
    }

    #[tokio::test]
    async fn test_post_round_trip_through_bootstrap() {
        let ioc = init_system(&test_layers(None)).await.unwrap();
        let posts = ioc.resolve::<PostRepo>().unwrap();

        let created = posts.create(&PostDoc::with_title("test post")).await.unwrap();
        let id = created.id.unwrap();
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);

        let found = posts.get(&id, GetOptions::default()).await.unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.title.as_deref(), Some("test post"));

        let missing = ObjectId::new();
        assert!(posts.get(&missing, GetOptions::no_throw()).await.unwrap().is_none());
        assert!(matches!(
            posts.get(&missing, GetOptions::default()).await,
            Err(AppError::NotFound(_))
        ));

        let store = resolve_store(&ioc).unwrap();
        finalize(&ioc).await.unwrap();
        assert!(!store.is_connected());
        finalize(&ioc).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_failure_is_returned() {
        let layers = test_layers(Some(json!({ "classes": [
            { "class": "DocumentStore", "config": { "unreachable": true } }
        ]})));

        let result = init_system(&layers).await;

        assert!(matches!(result, Err(AppError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_index_failure_is_returned() {
        let layers = test_layers(Some(json!({ "classes": [
            { "class": "DocumentStore", "config": { "failIndexBuild": "post" } }
        ]})));

        match init_system(&layers).await {
            Err(AppError::IndexBuildError { collection, .. }) => assert_eq!(collection, "post"),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_missing_mongo_uri_is_configuration_error() {
        let layers = test_layers(Some(json!({ "classes": [
            { "class": "Model", "config": { "mongoUri": null } }
        ]})));

        let result = init_system(&layers).await;

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }
}
