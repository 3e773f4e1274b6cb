//! # Component Registry - 의존성 주입 컨테이너
//!
//! 이 모듈은 애플리케이션 컴포넌트의 바인딩과 생명주기를 관리하는 컨테이너를 제공합니다.
//! Spring Framework의 ApplicationContext + BeanFactory 역할을 하지만, 리플렉션 대신
//! **식별자 → 팩토리 함수**의 명시적 레지스트리를 사용합니다.
//!
//! ## Spring Framework와의 비교
//!
//! | Spring 개념 | 이 시스템 | 비고 |
//! |-------------|-----------|------|
//! | `ApplicationContext` | [`Container`] | 프로세스당 하나, 컨텍스트로 전달 |
//! | `@Component` | [`ComponentRegistration`] | `inventory`로 컴파일 타임 수집 |
//! | `BeanDefinition` | `IocClassConfig` | 선언적 설정 레이어에서 생성 |
//! | `@Scope("singleton")` | [`Lifetime::Singleton`] | 기본값, 첫 요청 시 생성 |
//! | `@Scope("prototype")` | [`Lifetime::Transient`] | 요청마다 생성 |
//! | `registerSingleton()` | [`Container::bind_constant`] | 런타임 바인딩 |
//!
//! ## 동작 원리
//!
//! ```text
//! 1. 컴파일 타임 (Component Scanning)
//!    └─ inventory::submit!(ComponentRegistration { name, constructor })
//!
//! 2. 빌드 단계 (Container::build)
//!    ├─ 설정 레이어 병합 → IocConfig
//!    ├─ ConfigManager 생성 (중복 식별자 검사)
//!    ├─ class → implementation 팩토리 바인딩 (선언 순서)
//!    └─ IocConfig / Container 자기 참조 바인딩
//!
//! 3. 해석 (Container::get)
//!    ├─ 싱글톤 셀 확인 → 있으면 반환
//!    ├─ 현재 스레드의 해석 경로로 순환 참조 검사
//!    ├─ 팩토리 호출 (바인딩 락을 잡지 않은 상태)
//!    └─ 싱글톤은 OnceCell로 한 번만 생성, 동시 요청은 첫 생성을 기다림
//! ```
//!
//! 모든 실패는 `AppError`로 반환되며 패닉을 일으키지 않습니다.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use log::debug;
use once_cell::sync::{Lazy, OnceCell};

use crate::config::config_manager::ConfigManager;
use crate::config::ioc_config::{merge_layers, ConfigLayer, IocConfig};
use crate::errors::{AppError, AppResult};

/// 컨테이너에 저장되는 타입 소거된 인스턴스
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 런타임 바인딩에 사용하는 팩토리
pub type Factory = Arc<dyn Fn(&Arc<Container>) -> AppResult<Instance> + Send + Sync>;

/// 컨테이너 자기 참조 식별자
pub const CONTAINER_ID: &str = "Container";

/// 병합된 설정 식별자
pub const IOC_CONFIG_ID: &str = "IocConfig";

/// 고정 식별자로 조회할 수 있는 컴포넌트
///
/// 타입 이름을 런타임에 분석하는 대신, 각 컴포넌트가 자신의 식별자를 상수로 선언합니다.
pub trait Component: Any + Send + Sync {
    const ID: &'static str;
}

/// 컴포넌트 등록 정보
///
/// 설정의 `implementation`(또는 `class`) 이름으로 찾을 수 있는 팩토리입니다.
/// `inventory` 크레이트를 통해 컴파일 타임에 수집됩니다.
pub struct ComponentRegistration {
    /// 구현체 식별자 (검색 키로 사용)
    pub name: &'static str,
    /// 인스턴스 생성 함수 (지연 초기화에 사용)
    pub constructor: fn(&Arc<Container>) -> AppResult<Instance>,
}

inventory::collect!(ComponentRegistration);

/// 구현체 이름 → 등록정보 매핑 캐시
static COMPONENT_CACHE: Lazy<HashMap<&'static str, &'static ComponentRegistration>> = Lazy::new(|| {
    inventory::iter::<ComponentRegistration>()
        .map(|registration| (registration.name, registration))
        .collect()
});

/// 바인딩 수명
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// 첫 요청 시 생성하여 캐시
    Singleton,
    /// 요청마다 새로 생성
    Transient,
}

struct Binding {
    implementation: String,
    lifetime: Lifetime,
    factory: Factory,
    /// 싱글톤 인스턴스 (트랜지언트는 항상 비어 있음)
    instance: Arc<OnceCell<Instance>>,
}

impl Binding {
    fn new(implementation: impl Into<String>, lifetime: Lifetime, factory: Factory) -> Self {
        Self {
            implementation: implementation.into(),
            lifetime,
            factory,
            instance: Arc::new(OnceCell::new()),
        }
    }
}

thread_local! {
    /// 현재 스레드에서 생성 중인 (컨테이너 주소, 식별자) 경로
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// 해석 경로에 식별자를 올려두고, 드롭 시 내립니다.
struct ResolutionGuard {
    key: (usize, String),
}

impl ResolutionGuard {
    fn enter(container: &Container, id: &str) -> AppResult<Self> {
        let key = (container as *const Container as usize, id.to_string());
        RESOLVING.with(|path| {
            let mut path = path.borrow_mut();
            if path.contains(&key) {
                return Err(AppError::ConfigurationError(format!(
                    "Circular dependency detected: '{}' is already being constructed",
                    id
                )));
            }
            path.push(key.clone());
            Ok(Self { key })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|path| {
            let mut path = path.borrow_mut();
            if let Some(index) = path.iter().rposition(|entry| *entry == self.key) {
                path.remove(index);
            }
        });
    }
}

/// 의존성 주입 컨테이너
///
/// 프로세스 시작 시 한 번 만들어져 각 컴포넌트 생성자에 전달됩니다.
///
/// # 주요 기능
///
/// ## 1. 인스턴스 관리
/// - **싱글톤 보장**: 식별자당 하나의 인스턴스만 캐시
/// - **지연 초기화**: 첫 요청 시점에 인스턴스 생성
/// - **Thread-safe**: 짧은 `RwLock` 구간만 사용하며, 팩토리 호출 중에는 락을 잡지 않음
/// - **동시 해석**: 같은 싱글톤을 여러 스레드가 요청하면 첫 생성이 끝날 때까지 기다린 뒤 같은 인스턴스를 받음
///
/// ## 2. 의존성 해결
/// - **명시적 식별자**: 팩토리는 `&Arc<Container>`를 받아 필요한 의존성을 직접 조회
/// - **순환 참조 검출**: 스레드별 해석 경로를 추적하여 `ConfigurationError` 반환
///
/// 팩토리는 동기 함수이므로 한 번의 해석 체인은 한 스레드 안에서 끝납니다.
pub struct Container {
    config: Arc<IocConfig>,
    bindings: RwLock<HashMap<String, Binding>>,
    /// 바인딩 순서 (선언 순서 유지)
    order: RwLock<Vec<String>>,
    this: Weak<Container>,
}

impl Container {
    /// 설정 레이어를 병합하여 컨테이너를 만듭니다.
    pub fn build(layers: &[ConfigLayer]) -> AppResult<Arc<Self>> {
        Self::from_config(merge_layers(layers)?)
    }

    /// 병합된 설정으로 컨테이너를 만듭니다.
    ///
    /// # Errors
    ///
    /// - 중복 식별자 (구현체 별칭 포함) → `ConfigurationError`
    /// - 등록되지 않은 구현체 → `ConfigurationError`
    pub fn from_config(config: IocConfig) -> AppResult<Arc<Self>> {
        let config_manager = Arc::new(ConfigManager::new(&config)?);
        let debug_enabled = config.is_debug();
        let config = Arc::new(config);

        let container = Arc::new_cyclic(|this| Self {
            config: config.clone(),
            bindings: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            this: this.clone(),
        });

        container.bind_constant(IOC_CONFIG_ID, config.clone())?;
        // 자기 참조는 캐시하지 않음 (Arc 순환 방지)
        container.bind_factory(CONTAINER_ID, Lifetime::Transient, |ioc: &Arc<Container>| {
            Ok(ioc.clone() as Instance)
        })?;

        for class in &config.classes {
            if debug_enabled {
                debug!("load class {}", class.class);
            }

            if class.class == ConfigManager::ID {
                container.bind_constant(ConfigManager::ID, config_manager.clone())?;
                continue;
            }

            let implementation = class.implementation_name();
            let registration = COMPONENT_CACHE.get(implementation).ok_or_else(|| {
                AppError::ConfigurationError(format!(
                    "Can't resolve implementation '{}' for '{}'",
                    implementation, class.class
                ))
            })?;
            let lifetime = if class.is_singleton() {
                Lifetime::Singleton
            } else {
                Lifetime::Transient
            };
            let constructor = registration.constructor;
            container.insert_binding(
                &class.class,
                Binding::new(
                    implementation,
                    lifetime,
                    Arc::new(move |ioc: &Arc<Container>| constructor(ioc)),
                ),
            )?;
        }

        Ok(container)
    }

    /// 병합된 설정
    pub fn config(&self) -> &IocConfig {
        &self.config
    }

    pub fn is_bound(&self, id: &str) -> bool {
        read(&self.bindings).contains_key(id)
    }

    /// 바인딩된 식별자 목록 (바인딩 순서)
    pub fn bound_ids(&self) -> Vec<String> {
        read(&self.order).clone()
    }

    /// 바인딩의 구현체 이름
    pub fn implementation_of(&self, id: &str) -> Option<String> {
        read(&self.bindings).get(id).map(|b| b.implementation.clone())
    }

    /// 이미 생성된 인스턴스를 싱글톤으로 등록합니다.
    ///
    /// # Errors
    ///
    /// 같은 식별자가 이미 바인딩되어 있으면 `ConfigurationError`를 반환합니다.
    pub fn bind_constant<T: Any + Send + Sync>(&self, id: &str, instance: Arc<T>) -> AppResult<()> {
        let instance: Instance = instance;
        let cached = instance.clone();
        let binding = Binding {
            instance: Arc::new(OnceCell::with_value(instance)),
            ..Binding::new(
                id,
                Lifetime::Singleton,
                Arc::new(move |_: &Arc<Container>| Ok(cached.clone())),
            )
        };
        self.insert_binding(id, binding)
    }

    /// 런타임 팩토리 바인딩을 추가합니다.
    pub fn bind_factory<F>(&self, id: &str, lifetime: Lifetime, factory: F) -> AppResult<()>
    where
        F: Fn(&Arc<Container>) -> AppResult<Instance> + Send + Sync + 'static,
    {
        self.insert_binding(id, Binding::new(id, lifetime, Arc::new(factory)))
    }

    fn insert_binding(&self, id: &str, binding: Binding) -> AppResult<()> {
        let mut bindings = write(&self.bindings);
        if bindings.contains_key(id) {
            return Err(AppError::ConfigurationError(format!("'{}' is already bound", id)));
        }
        bindings.insert(id.to_string(), binding);
        write(&self.order).push(id.to_string());
        Ok(())
    }

    /// 식별자로 인스턴스를 조회합니다.
    ///
    /// ## 처리 과정
    ///
    /// 1. **바인딩 검색**: 없으면 `NotRegistered`
    /// 2. **캐시 확인**: 이미 생성된 싱글톤이 있으면 반환
    /// 3. **순환 참조 검사**: 현재 스레드의 해석 경로에 있으면 `ConfigurationError`
    /// 4. **인스턴스 생성**: 락 없이 팩토리 호출 (팩토리가 다시 `get`을 호출할 수 있음)
    /// 5. **캐싱**: 싱글톤은 셀에 한 번만 저장, 다른 스레드는 생성이 끝날 때까지 대기
    ///
    /// ```rust,ignore
    /// let logger = ioc.get::<Logger>("Logger")?;
    /// let logger = ioc.resolve::<Logger>()?; // Component::ID 사용
    /// ```
    pub fn get<T: Any + Send + Sync>(&self, id: &str) -> AppResult<Arc<T>> {
        let instance = self.get_instance(id)?;
        instance.downcast::<T>().map_err(|_| {
            AppError::InternalError(format!(
                "Type mismatch for '{}': expected {}",
                id,
                std::any::type_name::<T>()
            ))
        })
    }

    /// [`Component::ID`]로 인스턴스를 조회합니다.
    pub fn resolve<T: Component>(&self) -> AppResult<Arc<T>> {
        self.get::<T>(T::ID)
    }

    /// 타입 소거된 인스턴스를 조회합니다.
    pub fn get_instance(&self, id: &str) -> AppResult<Instance> {
        let (factory, lifetime, cell) = read(&self.bindings)
            .get(id)
            .map(|binding| (binding.factory.clone(), binding.lifetime, binding.instance.clone()))
            .ok_or_else(|| AppError::NotRegistered(format!("No binding for '{}'", id)))?;

        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }

        let this = self
            .this
            .upgrade()
            .ok_or_else(|| AppError::InternalError("Container was dropped".to_string()))?;
        // 순환 검사는 셀 초기화보다 먼저 해야 같은 스레드에서 셀을 재진입하지 않습니다
        let _guard = ResolutionGuard::enter(self, id)?;

        match lifetime {
            Lifetime::Singleton => cell.get_or_try_init(|| factory(&this)).cloned(),
            Lifetime::Transient => factory(&this),
        }
    }

    /// 싱글톤 인스턴스가 이미 생성되었는지 확인합니다.
    pub fn is_constructed(&self, id: &str) -> bool {
        read(&self.bindings)
            .get(id)
            .is_some_and(|binding| binding.instance.get().is_some())
    }

    /// 지정된 식별자들을 선언 순서대로 미리 생성합니다.
    pub fn instantiate(&self, ids: &[&str]) -> AppResult<()> {
        for id in ids {
            self.get_instance(id)?;
        }
        Ok(())
    }
}

// 락 poisoning은 내부 값을 꺼내 복구합니다. 바인딩 맵 갱신은 원자적입니다.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ioc_config::IocClassConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    static BUILT: AtomicUsize = AtomicUsize::new(0);
    static SLOW_BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counter {
        #[allow(dead_code)]
        serial: usize,
    }

    fn counter_component(_: &Arc<Container>) -> AppResult<Instance> {
        Ok(Arc::new(Counter {
            serial: BUILT.fetch_add(1, Ordering::SeqCst),
        }))
    }

    fn slow_component(_: &Arc<Container>) -> AppResult<Instance> {
        thread::sleep(Duration::from_millis(100));
        Ok(Arc::new(Counter {
            serial: SLOW_BUILT.fetch_add(1, Ordering::SeqCst),
        }))
    }

    fn cycle_a_component(ioc: &Arc<Container>) -> AppResult<Instance> {
        ioc.get_instance("CycleB")
    }

    fn cycle_b_component(ioc: &Arc<Container>) -> AppResult<Instance> {
        ioc.get_instance("CycleA")
    }

    inventory::submit! {
        ComponentRegistration { name: "TestCounter", constructor: counter_component }
    }

    inventory::submit! {
        ComponentRegistration { name: "TestSlow", constructor: slow_component }
    }

    inventory::submit! {
        ComponentRegistration { name: "TestCycleA", constructor: cycle_a_component }
    }

    inventory::submit! {
        ComponentRegistration { name: "TestCycleB", constructor: cycle_b_component }
    }

    fn container(classes: Vec<IocClassConfig>) -> AppResult<Arc<Container>> {
        Container::from_config(IocConfig { classes })
    }

    #[test]
    fn test_singleton_is_constructed_once() {
        let ioc = container(vec![IocClassConfig::new("Counter").with_implementation("TestCounter")]).unwrap();

        let first = ioc.get::<Counter>("Counter").unwrap();
        let second = ioc.get::<Counter>("Counter").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_transient_is_constructed_per_request() {
        let ioc = container(vec![IocClassConfig::new("Counter")
            .with_implementation("TestCounter")
            .transient()])
        .unwrap();

        let first = ioc.get::<Counter>("Counter").unwrap();
        let second = ioc.get::<Counter>("Counter").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_implementation_fails_build() {
        let result = container(vec![IocClassConfig::new("Mailer")]);

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_duplicate_identifier_fails_build() {
        let result = container(vec![
            IocClassConfig::new("Counter").with_implementation("TestCounter"),
            IocClassConfig::new("Other").with_implementation("Counter"),
        ]);

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_special_bindings_are_present() {
        let ioc = container(vec![]).unwrap();

        let this = ioc.get::<Container>(CONTAINER_ID).unwrap();
        assert!(Arc::ptr_eq(&this, &ioc));
        assert!(ioc.get::<IocConfig>(IOC_CONFIG_ID).unwrap().classes.is_empty());
    }

    #[test]
    fn test_singletons_are_lazy() {
        let ioc = container(vec![IocClassConfig::new("Counter").with_implementation("TestCounter")]).unwrap();

        assert!(ioc.is_bound("Counter"));
        assert!(!ioc.is_constructed("Counter"));

        ioc.instantiate(&["Counter"]).unwrap();
        assert!(ioc.is_constructed("Counter"));
    }

    #[test]
    fn test_circular_dependency_is_reported() {
        let ioc = container(vec![
            IocClassConfig::new("CycleA").with_implementation("TestCycleA"),
            IocClassConfig::new("CycleB").with_implementation("TestCycleB"),
        ])
        .unwrap();

        let result = ioc.get_instance("CycleA");

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
        assert!(RESOLVING.with(|path| path.borrow().is_empty()));
        assert!(!ioc.is_constructed("CycleA"));
    }

    #[test]
    fn test_concurrent_singleton_requests_share_one_construction() {
        let ioc = container(vec![IocClassConfig::new("Slow").with_implementation("TestSlow")]).unwrap();

        let (first, second) = thread::scope(|scope| {
            let first = scope.spawn(|| ioc.get::<Counter>("Slow"));
            let second = scope.spawn(|| ioc.get::<Counter>("Slow"));
            (first.join().unwrap(), second.join().unwrap())
        });

        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(SLOW_BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_reference_resolves_from_many_threads() {
        let ioc = container(vec![]).unwrap();

        let failures: usize = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..500)
                            .filter(|_| ioc.get::<Container>(CONTAINER_ID).is_err())
                            .count()
                    })
                })
                .collect();
            workers.into_iter().map(|worker| worker.join().unwrap()).sum()
        });

        assert_eq!(failures, 0);
    }

    #[test]
    fn test_bind_constant_rejects_rebinding() {
        let ioc = container(vec![]).unwrap();

        ioc.bind_constant("Answer", Arc::new(42u32)).unwrap();
        let result = ioc.bind_constant("Answer", Arc::new(43u32));

        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
        assert_eq!(*ioc.get::<u32>("Answer").unwrap(), 42);
    }

    #[test]
    fn test_missing_binding_is_not_registered() {
        let ioc = container(vec![]).unwrap();

        assert!(matches!(ioc.get_instance("Nope"), Err(AppError::NotRegistered(_))));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let ioc = container(vec![]).unwrap();
        ioc.bind_constant("Answer", Arc::new(42u32)).unwrap();

        assert!(matches!(ioc.get::<String>("Answer"), Err(AppError::InternalError(_))));
    }

    #[test]
    fn test_config_manager_is_prebuilt() {
        let ioc = container(vec![IocClassConfig::new(ConfigManager::ID)]).unwrap();

        assert!(ioc.resolve::<ConfigManager>().is_ok());
        assert_eq!(ioc.bound_ids()[..2], [IOC_CONFIG_ID.to_string(), CONTAINER_ID.to_string()]);
    }
}
