//! 스키마/리포지토리 디스커버리
//!
//! 디렉터리를 스캔하는 대신, 각 모듈이 컴파일 타임에 유닛을 제출합니다.
//!
//! ```rust,ignore
//! inventory::submit! {
//!     SchemaUnit { source: "domain::entities::posts", schemas: post_schemas }
//! }
//!
//! inventory::submit! {
//!     RepositoryUnit { source: "repositories::posts", repositories: post_repositories }
//! }
//! ```
//!
//! 리포지토리 유닛은 정확히 하나의 리포지토리를 선언해야 합니다.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::registry::{Component, Container, Instance};
use crate::errors::{AppError, AppResult};
use crate::models::schema::SchemaDescriptor;

/// 스키마 타입들을 선언하는 유닛
#[derive(Clone, Copy)]
pub struct SchemaUnit {
    pub source: &'static str,
    pub schemas: fn() -> Vec<SchemaDescriptor>,
}

inventory::collect!(SchemaUnit);

/// 리포지토리를 선언하는 유닛
#[derive(Clone, Copy)]
pub struct RepositoryUnit {
    pub source: &'static str,
    pub repositories: fn() -> Vec<RepositoryDescriptor>,
}

inventory::collect!(RepositoryUnit);

/// 컨테이너가 생성하는 리포지토리
pub trait Repository: Component + Sized {
    fn construct(ioc: &Arc<Container>) -> AppResult<Self>;
}

/// 리포지토리 바인딩 정보
#[derive(Clone, Copy)]
pub struct RepositoryDescriptor {
    pub id: &'static str,
    pub constructor: fn(&Arc<Container>) -> AppResult<Instance>,
}

impl RepositoryDescriptor {
    pub fn of<R: Repository>() -> Self {
        Self {
            id: R::ID,
            constructor: construct_repository::<R>,
        }
    }
}

fn construct_repository<R: Repository>(ioc: &Arc<Container>) -> AppResult<Instance> {
    Ok(Arc::new(R::construct(ioc)?))
}

/// 디스커버리 대상 유닛 모음
#[derive(Clone, Default)]
pub struct Discovery {
    schema_units: Vec<SchemaUnit>,
    repository_units: Vec<RepositoryUnit>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `inventory`로 제출된 모든 유닛
    pub fn collected() -> Self {
        Self {
            schema_units: inventory::iter::<SchemaUnit>().copied().collect(),
            repository_units: inventory::iter::<RepositoryUnit>().copied().collect(),
        }
    }

    pub fn with_schema_unit(mut self, unit: SchemaUnit) -> Self {
        self.schema_units.push(unit);
        self
    }

    pub fn with_repository_unit(mut self, unit: RepositoryUnit) -> Self {
        self.repository_units.push(unit);
        self
    }

    /// 모든 스키마 유닛의 설명자를 모읍니다.
    ///
    /// # Errors
    ///
    /// 같은 이름의 스키마가 두 번 나오면 `DiscoveryError`입니다.
    pub fn discover_schemas(&self) -> AppResult<Vec<SchemaDescriptor>> {
        let mut seen = HashSet::new();
        let mut schemas = Vec::new();

        for unit in &self.schema_units {
            for descriptor in (unit.schemas)() {
                if !seen.insert(descriptor.name) {
                    return Err(AppError::DiscoveryError(format!(
                        "Schema '{}' from {} is declared twice",
                        descriptor.name, unit.source
                    )));
                }
                schemas.push(descriptor);
            }
        }
        Ok(schemas)
    }

    /// 유닛마다 하나씩 리포지토리를 꺼냅니다.
    ///
    /// # Errors
    ///
    /// 리포지토리가 없거나 둘 이상인 유닛이 있으면 `DiscoveryError`입니다.
    pub fn discover_repositories(&self) -> AppResult<Vec<RepositoryDescriptor>> {
        self.repository_units
            .iter()
            .map(|unit| {
                let mut repositories = (unit.repositories)();
                match repositories.len() {
                    1 => Ok(repositories.remove(0)),
                    count => Err(AppError::DiscoveryError(format!(
                        "{} must contain exactly one repository, found {}",
                        unit.source, count
                    ))),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::Schema;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Tag;

    impl Schema for Tag {
        const NAME: &'static str = "Tag";
        const COLLECTION: &'static str = "tag";
    }

    struct TagRepo;

    impl Component for TagRepo {
        const ID: &'static str = "TagRepo";
    }

    impl Repository for TagRepo {
        fn construct(_: &Arc<Container>) -> AppResult<Self> {
            Ok(TagRepo)
        }
    }

    fn tag_schemas() -> Vec<SchemaDescriptor> {
        vec![SchemaDescriptor::of::<Tag>()]
    }

    fn no_repositories() -> Vec<RepositoryDescriptor> {
        Vec::new()
    }

    fn one_repository() -> Vec<RepositoryDescriptor> {
        vec![RepositoryDescriptor::of::<TagRepo>()]
    }

    fn two_repositories() -> Vec<RepositoryDescriptor> {
        vec![RepositoryDescriptor::of::<TagRepo>(), RepositoryDescriptor::of::<TagRepo>()]
    }

    #[test]
    fn test_duplicate_schema_is_rejected() {
        let discovery = Discovery::new()
            .with_schema_unit(SchemaUnit { source: "tags", schemas: tag_schemas })
            .with_schema_unit(SchemaUnit { source: "tags_again", schemas: tag_schemas });

        assert!(matches!(discovery.discover_schemas(), Err(AppError::DiscoveryError(_))));
    }

    #[test]
    fn test_repository_unit_must_declare_exactly_one() {
        let unit = |repositories: fn() -> Vec<RepositoryDescriptor>| {
            Discovery::new().with_repository_unit(RepositoryUnit { source: "repo", repositories })
        };

        assert!(matches!(unit(no_repositories).discover_repositories(), Err(AppError::DiscoveryError(_))));
        assert!(matches!(unit(two_repositories).discover_repositories(), Err(AppError::DiscoveryError(_))));

        let found = unit(one_repository).discover_repositories().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "TagRepo");
    }

    #[test]
    fn test_collected_includes_post_units() {
        let discovery = Discovery::collected();

        let schemas = discovery.discover_schemas().unwrap();
        assert!(schemas.iter().any(|schema| schema.name == "PostDoc"));

        let repositories = discovery.discover_repositories().unwrap();
        assert!(repositories.iter().any(|repository| repository.id == "PostRepo"));
    }
}
