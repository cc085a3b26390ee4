//! The execution topologies a render invocation can be scheduled across.
//!
//! The render configuration is process-wide, so tests that enter a scoped
//! configuration serialize on a file-local lock. Worker-process scenarios
//! need no scope here: each child owns an independent configuration.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use vignette::config::{ConfigDelta, ScopedConfig};
use vignette::dispatch::process::{ProcessPool, WorkerLauncher, WorkerTask};
use vignette::dispatch::{self, NestedPoolOpts};
use vignette::foundation::fs;
use vignette::{MAIN_CONTEXT_NAME, VignetteError, read_header};

fn config_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn scenario_dir(name: &str) -> PathBuf {
    let dir = Path::new("target").join("topology-tests").join(name);
    fs::fresh_dir(&dir).unwrap();
    dir
}

fn launcher() -> WorkerLauncher {
    WorkerLauncher::new(env!("CARGO_BIN_EXE_vignette"))
}

#[test]
fn direct_call_renders_a_full_artifact() {
    let _serial = config_lock();
    let out = scenario_dir("direct_call").join("output.vgc");

    let scope = ScopedConfig::enter(ConfigDelta::new().output_file(out.clone())).unwrap();
    let artifact = dispatch::run_direct().unwrap();
    assert!(artifact.plays > 0);
    assert_eq!(artifact.path, out);

    assert_eq!(scope.verify_artifact().unwrap(), out);
    let header = read_header(&out).unwrap();
    assert!(
        header.frame_count > 1,
        "expected a multi-frame artifact, got {} frame(s)",
        header.frame_count
    );
}

#[test]
fn renamed_thread_is_denied_and_leaves_no_artifact() {
    let _serial = config_lock();
    let out = scenario_dir("renamed_thread").join("output.vgc");

    let scope = ScopedConfig::enter(ConfigDelta::new().output_file(out.clone())).unwrap();
    let err = dispatch::run_on_named_thread("NotMainThread").unwrap_err();
    assert!(
        matches!(err, VignetteError::AffinityDenied { ref identity } if identity == "NotMainThread")
    );

    assert!(!out.exists());
    // The post-condition check is the detector for a missing artifact.
    assert!(matches!(
        scope.verify_artifact(),
        Err(VignetteError::ArtifactMismatch { found: None, .. })
    ));
}

#[test]
fn thread_named_main_thread_renders() {
    let _serial = config_lock();
    let out = scenario_dir("main_thread_name").join("output.vgc");

    let scope = ScopedConfig::enter(ConfigDelta::new().output_file(out.clone())).unwrap();
    let artifact = dispatch::run_on_named_thread(MAIN_CONTEXT_NAME).unwrap();
    assert!(artifact.plays > 0);

    scope.verify_artifact().unwrap();
    assert!(read_header(&out).unwrap().frame_count > 1);
}

#[test]
fn renamed_process_renders() {
    let out = scenario_dir("renamed_process").join("output.vgc");

    let artifact = dispatch::run_in_named_process(&launcher(), "NotMainThread", &out).unwrap();
    assert_eq!(artifact.path, out);
    assert!(artifact.plays > 0);
    assert!(read_header(&out).unwrap().frame_count > 1);
}

#[test]
fn thread_pool_over_process_pool_all_tasks_succeed() {
    let dir = scenario_dir("nested_pools");

    let opts = NestedPoolOpts {
        threads: 2,
        tasks_per_thread: 2,
    };
    let artifacts = dispatch::run_nested_pools(&launcher(), &dir, opts).unwrap();
    assert_eq!(artifacts.len(), 4);
    for artifact in &artifacts {
        assert!(artifact.plays > 0);
        assert!(
            read_header(&artifact.path).unwrap().frame_count > 1,
            "task artifact '{}' is not multi-frame",
            artifact.path.display()
        );
    }
}

#[test]
fn process_pool_failure_surfaces_after_all_tasks_complete() {
    let dir = scenario_dir("pool_failure");
    let good = dir.join("good.vgc");
    // Parent directory intentionally missing; the worker's scoped
    // configuration rejects it.
    let bad = dir.join("missing-subdir").join("bad.vgc");

    let pool = ProcessPool::new(launcher());
    let err = pool
        .run_all(vec![
            WorkerTask {
                process_name: "PooledWorker-0".to_string(),
                output_file: bad,
            },
            WorkerTask {
                process_name: "PooledWorker-1".to_string(),
                output_file: good.clone(),
            },
        ])
        .unwrap_err();

    assert!(matches!(err, VignetteError::Configuration(_)));
    // The sibling task still ran to completion behind the join barrier.
    assert!(good.exists());
    assert!(read_header(&good).unwrap().frame_count > 1);
}
