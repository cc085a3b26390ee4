//! Execution topology driver.
//!
//! Composes render invocations across direct calls, named threads, named
//! worker processes, and a thread-pool→process-pool hierarchy. Every
//! scheduled invocation completes (successfully or not) before a scenario
//! returns, and failures surface where the caller collects results. A denial
//! is a terminal outcome for that invocation, never retried.

pub mod process;
pub mod thread;

use std::path::Path;

use crate::affinity::{ExecutionContext, RenderPermit};
use crate::dispatch::process::{ProcessPool, WorkerLauncher, WorkerTask};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::session::{Artifact, RenderSession};
use crate::scene::model::Scene;

/// Run one render invocation on `ctx`: acquire the permit, build the demo
/// scene, render into the configured output.
///
/// Must run inside an active scoped configuration. Denial happens before any
/// output is opened.
pub fn run_render(ctx: &ExecutionContext) -> VignetteResult<Artifact> {
    let permit = RenderPermit::acquire(ctx)?;
    let mut session = RenderSession::new(Scene::circle_reveal());
    session.render(&permit)
}

/// Direct call on the context that owns the rendering backend.
pub fn run_direct() -> VignetteResult<Artifact> {
    run_render(&ExecutionContext::main())
}

/// A single explicitly named thread running the invocation.
///
/// Succeeds only when `name` is the sentinel identity; any other name is
/// denied by the guard, and the denial propagates through `join`.
pub fn run_on_named_thread(name: &str) -> VignetteResult<Artifact> {
    thread::spawn_named(name, |ctx| run_render(ctx))?.join()
}

/// A single explicitly named worker process running the invocation.
///
/// Process identity is never checked by the guard, so this succeeds for any
/// `name`. The worker renders into `output`, whose parent directory must
/// already exist.
pub fn run_in_named_process(
    launcher: &WorkerLauncher,
    name: &str,
    output: &Path,
) -> VignetteResult<Artifact> {
    launcher
        .spawn(WorkerTask {
            process_name: name.to_string(),
            output_file: output.to_path_buf(),
        })?
        .wait()
}

/// Sizing for [`run_nested_pools`].
#[derive(Clone, Copy, Debug)]
pub struct NestedPoolOpts {
    /// Worker threads in the outer pool.
    pub threads: usize,
    /// Process tasks each thread submits.
    pub tasks_per_thread: usize,
}

impl Default for NestedPoolOpts {
    fn default() -> Self {
        Self {
            threads: 2,
            tasks_per_thread: 1,
        }
    }
}

/// A named thread pool whose workers each submit tasks to a process pool.
///
/// Pool threads carry non-sentinel names and never render themselves; only
/// the spawned worker processes do, and process identity is never checked.
/// Each thread waits on its own process batch, and all batches complete
/// before the first failure (if any) is reported.
pub fn run_nested_pools(
    launcher: &WorkerLauncher,
    out_dir: &Path,
    opts: NestedPoolOpts,
) -> VignetteResult<Vec<Artifact>> {
    if opts.threads == 0 || opts.tasks_per_thread == 0 {
        return Err(VignetteError::validation(
            "nested pools need at least one thread and one task per thread",
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads)
        .thread_name(|i| format!("vignette-pool-{i}"))
        .build()
        .map_err(|e| VignetteError::worker(format!("failed to build thread pool: {e}")))?;

    use rayon::prelude::*;
    let groups: Vec<usize> = (0..opts.threads).collect();
    let batches: Vec<VignetteResult<Vec<Artifact>>> = pool.install(|| {
        groups
            .par_iter()
            .map(|&group| {
                let procs = ProcessPool::new(launcher.clone());
                let tasks = (0..opts.tasks_per_thread)
                    .map(|task| WorkerTask {
                        process_name: format!("NotMainThread-{group}-{task}"),
                        output_file: out_dir.join(format!("task-{group}-{task}.vgc")),
                    })
                    .collect();
                procs.run_all(tasks)
            })
            .collect()
    });

    // Every batch has completed here; surface the first failure after
    // collection.
    let mut artifacts = Vec::with_capacity(opts.threads * opts.tasks_per_thread);
    for batch in batches {
        artifacts.extend(batch?);
    }
    Ok(artifacts)
}
