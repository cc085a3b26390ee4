use std::thread::{Builder, JoinHandle};

use crate::affinity::ExecutionContext;
use crate::foundation::error::{VignetteError, VignetteResult};

/// A worker thread spawned with an explicit identity name.
pub struct NamedThread<T> {
    name: String,
    handle: JoinHandle<VignetteResult<T>>,
}

/// Spawn `work` on a thread named `name`.
///
/// The closure receives the execution context derived from the thread that
/// actually runs it, so the identity the affinity guard sees is the live OS
/// thread name, not the caller's.
pub fn spawn_named<T, F>(name: &str, work: F) -> VignetteResult<NamedThread<T>>
where
    T: Send + 'static,
    F: FnOnce(&ExecutionContext) -> VignetteResult<T> + Send + 'static,
{
    tracing::debug!(name, "spawning named thread");
    let handle = Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let ctx = ExecutionContext::from_current_thread();
            work(&ctx)
        })
        .map_err(|e| VignetteError::worker(format!("failed to spawn thread '{name}': {e}")))?;
    Ok(NamedThread {
        name: name.to_string(),
        handle,
    })
}

impl<T> NamedThread<T> {
    /// Thread identity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the worker finishes and propagate its result.
    ///
    /// A panicked worker surfaces as a worker error rather than vanishing.
    pub fn join(self) -> VignetteResult<T> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(VignetteError::worker(format!(
                "thread '{}' panicked",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_sees_its_own_thread_identity() {
        let worker = spawn_named("identity-probe", |ctx| Ok(ctx.identity().to_string())).unwrap();
        assert_eq!(worker.name(), "identity-probe");
        assert_eq!(worker.join().unwrap(), "identity-probe");
    }

    #[test]
    fn join_propagates_the_worker_error() {
        let worker = spawn_named("failing-worker", |_ctx| {
            Err::<(), _>(VignetteError::validation("boom"))
        })
        .unwrap();
        assert!(matches!(
            worker.join(),
            Err(VignetteError::Validation(_))
        ));
    }

    #[test]
    fn join_reports_a_panicked_worker() {
        let worker = spawn_named::<(), _>("panicking-worker", |_ctx| panic!("kaboom")).unwrap();
        let err = worker.join().unwrap_err();
        assert!(matches!(err, VignetteError::Worker(_)));
        assert!(err.to_string().contains("panicking-worker"));
    }
}
