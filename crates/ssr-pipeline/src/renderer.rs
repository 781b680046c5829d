//! Renderer boundary.

use std::ops::Deref;

use async_trait::async_trait;
use ssr_core::PrerenderContext;

/// A router instance that lives for exactly one render.
pub trait TransientRouter: Send + Sync {
    /// Location the router was created for.
    fn location(&self) -> &str;

    /// Release the router. Called once, after render.
    fn dispose(&mut self);
}

/// Renders a matched route to markup.
#[async_trait]
pub trait SsrRenderer: Send + Sync {
    /// Router type created per render.
    type Router: TransientRouter;

    /// Create a router positioned at `location` (path plus query).
    fn create_router(&self, location: &str) -> Self::Router;

    /// Render the route subtree for the context.
    async fn render(&self, router: &Self::Router, ctx: &PrerenderContext) -> anyhow::Result<String>;
}

/// Disposes a transient router when dropped.
///
/// Teardown runs whether render returns, fails, or unwinds.
#[derive(Debug)]
pub struct RouterGuard<T: TransientRouter> {
    router: Option<T>,
}

impl<T: TransientRouter> RouterGuard<T> {
    /// Take ownership of a router.
    pub fn new(router: T) -> Self {
        Self {
            router: Some(router),
        }
    }
}

impl<T: TransientRouter> Deref for RouterGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `drop` empties the slot.
        match &self.router {
            Some(router) => router,
            None => unreachable!("router guard used after drop"),
        }
    }
}

impl<T: TransientRouter> Drop for RouterGuard<T> {
    fn drop(&mut self) {
        if let Some(mut router) = self.router.take() {
            tracing::trace!(location = router.location(), "disposing router");
            router.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingRouter {
        location: String,
        disposed: Arc<AtomicUsize>,
    }

    impl TransientRouter for CountingRouter {
        fn location(&self) -> &str {
            &self.location
        }

        fn dispose(&mut self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn router(disposed: &Arc<AtomicUsize>) -> CountingRouter {
        CountingRouter {
            location: "/a".into(),
            disposed: Arc::clone(disposed),
        }
    }

    #[test]
    fn test_dispose_on_drop() {
        let disposed = Arc::new(AtomicUsize::new(0));
        {
            let guard = RouterGuard::new(router(&disposed));
            assert_eq!(guard.location(), "/a");
            assert_eq!(disposed.load(Ordering::SeqCst), 0);
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispose_on_panic() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&disposed);

        let result = std::panic::catch_unwind(move || {
            let _guard = RouterGuard::new(router(&handle));
            panic!("render blew up");
        });

        assert!(result.is_err());
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }
}
