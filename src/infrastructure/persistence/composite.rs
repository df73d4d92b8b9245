//! Composite Persistence - 一次保存分发到多个后端
//!
//! 每个后端独立执行，某个后端失败不影响其余后端

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{NovelPersistencePort, RepositoryError};
use crate::domain::novel::{Chapter, Novel};

pub struct CompositePersistence {
    backends: Vec<Arc<dyn NovelPersistencePort>>,
}

impl CompositePersistence {
    pub fn new(backends: Vec<Arc<dyn NovelPersistencePort>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.backend()).collect()
    }
}

/// 记录失败，保留最后一个错误
fn collect(
    backend: &dyn NovelPersistencePort,
    operation: &str,
    result: Result<(), RepositoryError>,
    last_error: &mut Option<RepositoryError>,
) {
    if let Err(e) = result {
        tracing::warn!(
            backend = backend.backend(),
            operation,
            error = %e,
            "Persistence backend failed"
        );
        *last_error = Some(e);
    }
}

fn finish(last_error: Option<RepositoryError>) -> Result<(), RepositoryError> {
    match last_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[async_trait]
impl NovelPersistencePort for CompositePersistence {
    fn backend(&self) -> &'static str {
        "composite"
    }

    async fn save_config(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let mut last_error = None;
        for backend in &self.backends {
            let result = backend.save_config(novel).await;
            collect(backend.as_ref(), "save_config", result, &mut last_error);
        }
        finish(last_error)
    }

    async fn save_outline(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let mut last_error = None;
        for backend in &self.backends {
            let result = backend.save_outline(novel).await;
            collect(backend.as_ref(), "save_outline", result, &mut last_error);
        }
        finish(last_error)
    }

    async fn save_chapter(
        &self,
        novel: &Novel,
        chapter: &Chapter,
        position: usize,
    ) -> Result<(), RepositoryError> {
        let mut last_error = None;
        for backend in &self.backends {
            let result = backend.save_chapter(novel, chapter, position).await;
            collect(backend.as_ref(), "save_chapter", result, &mut last_error);
        }
        finish(last_error)
    }

    async fn save_all_chapters(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let mut last_error = None;
        for backend in &self.backends {
            let result = backend.save_all_chapters(novel).await;
            collect(backend.as_ref(), "save_all_chapters", result, &mut last_error);
        }
        finish(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn hit(&self) -> Result<(), RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RepositoryError::IoError("read-only".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl NovelPersistencePort for Counting {
        fn backend(&self) -> &'static str {
            "counting"
        }
        async fn save_config(&self, _novel: &Novel) -> Result<(), RepositoryError> {
            self.hit()
        }
        async fn save_outline(&self, _novel: &Novel) -> Result<(), RepositoryError> {
            self.hit()
        }
        async fn save_chapter(
            &self,
            _novel: &Novel,
            _chapter: &Chapter,
            _position: usize,
        ) -> Result<(), RepositoryError> {
            self.hit()
        }
        async fn save_all_chapters(&self, _novel: &Novel) -> Result<(), RepositoryError> {
            self.hit()
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_skip_other_backends() {
        let failing = Counting::new(true);
        let healthy = Counting::new(false);
        let composite = CompositePersistence::new(vec![
            failing.clone() as Arc<dyn NovelPersistencePort>,
            healthy.clone() as Arc<dyn NovelPersistencePort>,
        ]);

        let result = composite.save_config(&Novel::new()).await;

        assert!(matches!(result, Err(RepositoryError::IoError(_))));
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_composite_succeeds() {
        let composite = CompositePersistence::new(Vec::new());
        assert!(composite.save_all_chapters(&Novel::new()).await.is_ok());
    }
}
