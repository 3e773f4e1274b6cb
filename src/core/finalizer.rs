//! # Finalizer - 종료 작업 레지스트리
//!
//! 연결 해제처럼 프로세스 종료 전에 반드시 실행해야 하는 비동기 작업을 소유자별로
//! 보관합니다. 소유자 하나당 작업은 하나입니다.
//!
//! ## 실행 순서
//!
//! ```text
//! add_finalizer(db)      ─┐
//! add_finalizer(cache)   ─┤  등록 순서
//! add_finalizer(server)  ─┘
//!
//! finalize()  →  server, cache, db  (역순으로 시작, 모두 완료될 때까지 대기)
//! ```
//!
//! 나중에 등록된 소유자는 먼저 등록된 소유자에 의존할 수 있으므로 역순으로 시작합니다.
//! 작업들은 동시에 진행되며, 하나가 실패해도 나머지는 끝까지 실행됩니다.

use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;

use crate::core::logger::Logger;
use crate::core::registry::{Component, ComponentRegistration, Container, Instance};
use crate::errors::{AppError, AppResult};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// 종료 작업 소유자 식별자
///
/// 같은 타입의 인스턴스라도 서로 다른 id를 가집니다. 비교와 해시는 id만 사용합니다.
#[derive(Debug, Clone)]
pub struct OwnerId {
    id: u64,
    label: String,
}

impl OwnerId {
    pub fn new(kind: &str) -> Self {
        let id = NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            label: format!("{}-{}", kind, id),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for OwnerId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OwnerId {}

impl Hash for OwnerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

type FinalizeFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;
type FinalizeAction = Box<dyn FnOnce() -> FinalizeFuture + Send>;

struct FinalizerEntry {
    owner: OwnerId,
    action: FinalizeAction,
}

/// 소유자별 종료 작업 레지스트리
pub struct Finalizer {
    logger: Arc<Logger>,
    entries: Mutex<Vec<FinalizerEntry>>,
}

impl Component for Finalizer {
    const ID: &'static str = "Finalizer";
}

impl Finalizer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// 소유자의 종료 작업을 등록합니다.
    ///
    /// # Errors
    ///
    /// 이미 작업이 등록된 소유자면 `ConfigurationError`입니다.
    pub fn add_finalizer<F, Fut>(&self, owner: &OwnerId, action: F) -> AppResult<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let mut entries = self.entries();
        if entries.iter().any(|entry| entry.owner == *owner) {
            return Err(AppError::ConfigurationError(format!(
                "Finalizer for {} is already registered",
                owner
            )));
        }
        entries.push(FinalizerEntry {
            owner: owner.clone(),
            action: Box::new(move || Box::pin(action()) as FinalizeFuture),
        });
        self.logger.debug(format_args!("Finalizer registered for {}", owner));
        Ok(())
    }

    /// 소유자의 종료 작업을 제거합니다. 없으면 아무것도 하지 않습니다.
    pub fn remove_finalizer(&self, owner: &OwnerId) {
        let mut entries = self.entries();
        match entries.iter().position(|entry| entry.owner == *owner) {
            Some(index) => {
                entries.remove(index);
            }
            None => self
                .logger
                .debug(format_args!("No finalizer registered for {}", owner)),
        }
    }

    pub fn has_finalizer(&self, owner: &OwnerId) -> bool {
        self.entries().iter().any(|entry| entry.owner == *owner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// 등록된 종료 작업을 실행합니다.
    ///
    /// `skip`에 포함된 소유자의 작업은 실행하지 않고 등록 상태로 남깁니다.
    /// 실행된 작업은 레지스트리에서 제거되므로 두 번째 호출은 아무 작업도 하지 않습니다.
    ///
    /// # Errors
    ///
    /// 실패한 작업이 있으면 모든 작업이 끝난 뒤 `FinalizationError`를 반환합니다.
    /// 첫 번째 실패가 메시지에 담기고 나머지는 로그로 남습니다.
    pub async fn finalize(&self, skip: &[OwnerId]) -> AppResult<()> {
        let (to_run, skipped) = self.take_runnable(skip);

        for owner in &skipped {
            self.logger.warn(format_args!("Finalizer for {} was skipped", owner));
        }
        if to_run.is_empty() {
            return Ok(());
        }

        self.logger
            .info(format_args!("🧹 Running {} finalizer(s)", to_run.len()));

        // 작업은 역순으로 즉시 시작하고, 완료는 한꺼번에 기다립니다.
        let running: Vec<_> = to_run
            .into_iter()
            .rev()
            .map(|entry| {
                let owner = entry.owner;
                let future = (entry.action)();
                async move { (owner, future.await) }
            })
            .collect();

        let mut first_error: Option<String> = None;
        let mut failures = 0;
        for (owner, result) in join_all(running).await {
            if let Err(e) = result {
                self.logger
                    .error(format_args!("Finalizer for {} failed: {}", owner, e));
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(format!("{}: {}", owner, e));
                }
            }
        }

        match first_error {
            Some(first) => Err(AppError::FinalizationError(format!(
                "{} finalizer(s) failed, first: {}",
                failures, first
            ))),
            None => Ok(()),
        }
    }

    /// 실행할 작업을 꺼내고, 건너뛴 작업은 레지스트리에 남깁니다.
    /// 두 번째 값은 실제로 등록되어 있다가 건너뛴 소유자들입니다.
    fn take_runnable(&self, skip: &[OwnerId]) -> (Vec<FinalizerEntry>, Vec<OwnerId>) {
        let mut entries = self.entries();
        let (kept, run): (Vec<_>, Vec<_>) = entries
            .drain(..)
            .partition(|entry| skip.contains(&entry.owner));
        let skipped = kept.iter().map(|entry| entry.owner.clone()).collect();
        *entries = kept;
        (run, skipped)
    }

    fn entries(&self) -> MutexGuard<'_, Vec<FinalizerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn finalizer_component(ioc: &Arc<Container>) -> AppResult<Instance> {
    Ok(Arc::new(Finalizer::new(ioc.resolve::<Logger>()?)))
}

inventory::submit! {
    ComponentRegistration { name: Finalizer::ID, constructor: finalizer_component }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as AsyncMutex;

    fn finalizer() -> Finalizer {
        Finalizer::new(Arc::new(Logger::new(LevelFilter::Off)))
    }

    #[test]
    fn test_owner_ids_are_distinct() {
        let a = OwnerId::new("Model");
        let b = OwnerId::new("Model");

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.label().starts_with("Model-"));
    }

    #[test]
    fn test_one_finalizer_per_owner() {
        let finalizer = finalizer();
        let owner = OwnerId::new("Store");

        finalizer.add_finalizer(&owner, || async { Ok(()) }).unwrap();
        let second = finalizer.add_finalizer(&owner, || async { Ok(()) });

        assert!(matches!(second, Err(AppError::ConfigurationError(_))));
        assert_eq!(finalizer.len(), 1);
    }

    #[test]
    fn test_remove_unknown_owner_is_noop() {
        let finalizer = finalizer();
        let owner = OwnerId::new("Store");
        finalizer.add_finalizer(&owner, || async { Ok(()) }).unwrap();

        finalizer.remove_finalizer(&OwnerId::new("Other"));
        assert!(finalizer.has_finalizer(&owner));

        finalizer.remove_finalizer(&owner);
        assert!(finalizer.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_runs_in_reverse_registration_order() {
        let finalizer = finalizer();
        let started = Arc::new(AsyncMutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let started = started.clone();
            finalizer
                .add_finalizer(&OwnerId::new(name), move || async move {
                    started.lock().await.push(name);
                    Ok(())
                })
                .unwrap();
        }

        finalizer.finalize(&[]).await.unwrap();

        assert_eq!(*started.lock().await, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_skipped_owner_is_not_run() {
        let finalizer = finalizer();
        let runs = Arc::new(AtomicUsize::new(0));
        let kept = OwnerId::new("kept");
        let skipped = OwnerId::new("skipped");

        for owner in [&kept, &skipped] {
            let runs = runs.clone();
            finalizer
                .add_finalizer(owner, move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        finalizer.finalize(&[skipped.clone()]).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(finalizer.has_finalizer(&skipped));
        assert!(!finalizer.has_finalizer(&kept));
    }

    #[test]
    fn test_only_registered_owners_are_reported_as_skipped() {
        let finalizer = finalizer();
        let registered = OwnerId::new("registered");
        let unknown = OwnerId::new("unknown");
        finalizer.add_finalizer(&registered, || async { Ok(()) }).unwrap();

        let (run, skipped) = finalizer.take_runnable(&[registered.clone(), unknown]);

        assert!(run.is_empty());
        assert_eq!(skipped, vec![registered.clone()]);
        assert!(finalizer.has_finalizer(&registered));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_actions() {
        let finalizer = finalizer();
        let runs = Arc::new(AtomicUsize::new(0));

        finalizer
            .add_finalizer(&OwnerId::new("ok"), {
                let runs = runs.clone();
                move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        finalizer
            .add_finalizer(&OwnerId::new("broken"), || async {
                Err(AppError::DatabaseError("close failed".to_string()))
            })
            .unwrap();

        let result = finalizer.finalize(&[]).await;

        assert!(matches!(result, Err(AppError::FinalizationError(_))));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_finalize_is_noop() {
        let finalizer = finalizer();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        finalizer
            .add_finalizer(&OwnerId::new("once"), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        finalizer.finalize(&[]).await.unwrap();
        finalizer.finalize(&[]).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
