//! Execution-context identity and the thread-affinity guard.
//!
//! The rendering backend binds to the execution context that first touches
//! it, and thread identity is the load-bearing signal: a thread may render
//! only under the sentinel name. Process identity is never checked; a worker
//! process owns a fresh backend of its own, whatever it is called.
//!
//! Rather than looking the current thread name up at render time, permission
//! is modeled as an explicit capability: callers acquire a [`RenderPermit`]
//! from their [`ExecutionContext`] and pass it into the render session.

use crate::foundation::error::{VignetteError, VignetteResult};

/// Thread identity that owns the rendering backend.
pub const MAIN_CONTEXT_NAME: &str = "MainThread";

/// Kind of a unit of concurrent execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    Thread,
    Process,
}

/// Identity of the context a render invocation runs on.
///
/// The identity is fixed at construction and is what [`RenderPermit::acquire`]
/// consults. Thread and process identities are evaluated independently per
/// kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    kind: ContextKind,
    identity: String,
}

impl ExecutionContext {
    /// The context that initialized the rendering backend.
    pub fn main() -> Self {
        Self {
            kind: ContextKind::Thread,
            identity: MAIN_CONTEXT_NAME.to_string(),
        }
    }

    /// Context of the live OS thread, carrying whatever name it was spawned
    /// with.
    pub fn from_current_thread() -> Self {
        let identity = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        Self {
            kind: ContextKind::Thread,
            identity,
        }
    }

    /// A worker-process context with the given process name.
    pub fn process(name: impl Into<String>) -> Self {
        Self {
            kind: ContextKind::Process,
            identity: name.into(),
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether the guard admits this context.
    pub fn is_render_safe(&self) -> bool {
        match self.kind {
            ContextKind::Process => true,
            ContextKind::Thread => self.identity == MAIN_CONTEXT_NAME,
        }
    }
}

/// Capability proving the holder's execution context may drive the rendering
/// backend.
///
/// Acquired once per invocation; denial happens before any output is opened,
/// so a denied invocation leaves no partial artifact behind.
#[derive(Debug)]
pub struct RenderPermit {
    identity: String,
}

impl RenderPermit {
    /// Check `ctx` against the affinity rules.
    ///
    /// Process contexts are always admitted. Thread contexts are admitted
    /// only under [`MAIN_CONTEXT_NAME`]; any other thread identity is an
    /// [`VignetteError::AffinityDenied`].
    pub fn acquire(ctx: &ExecutionContext) -> VignetteResult<Self> {
        if !ctx.is_render_safe() {
            return Err(VignetteError::affinity_denied(ctx.identity.clone()));
        }
        tracing::debug!(identity = ctx.identity(), kind = ?ctx.kind(), "render permit granted");
        Ok(Self {
            identity: ctx.identity.clone(),
        })
    }

    /// Identity the permit was granted to.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_context_is_admitted() {
        assert!(RenderPermit::acquire(&ExecutionContext::main()).is_ok());
    }

    #[test]
    fn renamed_thread_is_denied() {
        let ctx = ExecutionContext {
            kind: ContextKind::Thread,
            identity: "NotMainThread".to_string(),
        };
        let err = RenderPermit::acquire(&ctx).unwrap_err();
        assert!(
            matches!(err, VignetteError::AffinityDenied { ref identity } if identity == "NotMainThread")
        );
    }

    #[test]
    fn process_identity_is_never_checked() {
        assert!(RenderPermit::acquire(&ExecutionContext::process("NotMainThread")).is_ok());
        assert!(RenderPermit::acquire(&ExecutionContext::process("MainThread")).is_ok());
        assert!(RenderPermit::acquire(&ExecutionContext::process("")).is_ok());
    }

    #[test]
    fn current_thread_context_reads_the_os_thread_name() {
        let handle = std::thread::Builder::new()
            .name("affinity-probe".to_string())
            .spawn(|| ExecutionContext::from_current_thread())
            .unwrap();
        let ctx = handle.join().unwrap();
        assert_eq!(ctx.kind(), ContextKind::Thread);
        assert_eq!(ctx.identity(), "affinity-probe");
    }

    #[test]
    fn permit_records_the_granted_identity() {
        let permit = RenderPermit::acquire(&ExecutionContext::main()).unwrap();
        assert_eq!(permit.identity(), MAIN_CONTEXT_NAME);
    }
}
