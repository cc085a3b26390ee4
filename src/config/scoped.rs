use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use std::thread::ThreadId;

use crate::config::{ConfigDelta, ConfigKey, ConfigValue, snapshot, store};
use crate::foundation::error::{VignetteError, VignetteResult};

struct GateState {
    owner: Option<ThreadId>,
    depth: u32,
}

/// Serializes scoped sections across threads while letting the owning thread
/// nest scopes. Two threads interleaving scoped overrides on the shared
/// configuration would otherwise race with last-write-wins results.
struct ScopeGate {
    state: Mutex<GateState>,
    cv: Condvar,
}

impl ScopeGate {
    fn acquire(&self) {
        let current = std::thread::current().id();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match state.owner {
                None => {
                    state.owner = Some(current);
                    state.depth = 1;
                    return;
                }
                Some(owner) if owner == current => {
                    state.depth += 1;
                    return;
                }
                Some(_) => {
                    state = self.cv.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.owner = None;
            self.cv.notify_one();
        }
    }
}

fn scope_gate() -> &'static ScopeGate {
    static GATE: OnceLock<ScopeGate> = OnceLock::new();
    GATE.get_or_init(|| ScopeGate {
        state: Mutex::new(GateState {
            owner: None,
            depth: 0,
        }),
        cv: Condvar::new(),
    })
}

#[derive(Debug)]
struct GateGuard;

impl GateGuard {
    fn acquire() -> Self {
        scope_gate().acquire();
        Self
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        scope_gate().release();
    }
}

/// A temporary, restorable override of the process-wide render configuration.
///
/// `enter` captures the prior value of every overridden option and applies
/// the delta; dropping the scope restores exactly those options, on panic and
/// error paths included. Scopes nest per option: each scope restores only
/// what it overrode.
#[derive(Debug)]
pub struct ScopedConfig {
    saved: Vec<(ConfigKey, ConfigValue)>,
    entered_output: PathBuf,
    // Field order matters: restoration in `drop` must run before the gate is
    // released.
    _gate: GateGuard,
}

impl ScopedConfig {
    /// Apply `delta` to the process-wide configuration for the lifetime of
    /// the returned scope.
    ///
    /// An invalid override (an `output_file` whose parent directory does not
    /// exist, or a type-mismatched value) fails with a configuration error
    /// and leaves the global state untouched.
    pub fn enter(delta: ConfigDelta) -> VignetteResult<Self> {
        let gate = GateGuard::acquire();
        let mut cfg = store().write().unwrap_or_else(PoisonError::into_inner);

        // Dry-run against a copy so a bad override cannot leave the live
        // configuration half-applied.
        let mut probe = cfg.clone();
        for (key, value) in delta.entries() {
            probe.set(*key, value.clone())?;
        }
        if delta.contains(ConfigKey::OutputFile) {
            let parent = output_parent(&probe.output_file);
            if !parent.is_dir() {
                return Err(VignetteError::configuration(format!(
                    "output directory '{}' does not exist",
                    parent.display()
                )));
            }
        }

        let mut saved = Vec::with_capacity(delta.len());
        for (key, value) in delta.entries() {
            let prior = cfg.set(*key, value.clone())?;
            saved.push((*key, prior));
        }
        let entered_output = cfg.output_file.clone();
        drop(cfg);

        tracing::debug!(
            output = %entered_output.display(),
            options = saved.len(),
            "entered scoped render configuration"
        );
        Ok(Self {
            saved,
            entered_output,
            _gate: gate,
        })
    }

    /// Output path in effect inside this scope.
    pub fn output_file(&self) -> &Path {
        &self.entered_output
    }

    /// Check the render post-condition: the configured output still names the
    /// path in effect when this scope was entered, and that artifact exists
    /// on disk.
    ///
    /// A failure here signals configuration cross-contamination or a render
    /// that produced nothing, not a renderer bug.
    pub fn verify_artifact(&self) -> VignetteResult<PathBuf> {
        let current = snapshot().output_file;
        if current != self.entered_output {
            return Err(VignetteError::ArtifactMismatch {
                expected: self.entered_output.clone(),
                found: Some(current),
            });
        }
        if !self.entered_output.is_file() {
            return Err(VignetteError::ArtifactMismatch {
                expected: self.entered_output.clone(),
                found: None,
            });
        }
        Ok(self.entered_output.clone())
    }
}

impl Drop for ScopedConfig {
    fn drop(&mut self) {
        let mut cfg = store().write().unwrap_or_else(PoisonError::into_inner);
        while let Some((key, value)) = self.saved.pop() {
            // Saved values came from the live configuration, so re-applying
            // them cannot hit a type mismatch.
            let _ = cfg.set(key, value);
        }
        drop(cfg);
        tracing::debug!("restored render configuration");
    }
}

/// Directory that must exist for `path` to be writable. A bare file name
/// resolves against the current directory.
fn output_parent(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
