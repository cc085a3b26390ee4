use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use anyhow::Context as _;

use crate::foundation::error::{VignetteError, VignetteResult};
use crate::render::session::Artifact;

/// One unit of work for a worker process.
#[derive(Clone, Debug)]
pub struct WorkerTask {
    /// Process identity name the worker runs under. Never checked by the
    /// affinity guard.
    pub process_name: String,
    /// Artifact path the worker renders into. Its parent directory must
    /// already exist; preparing it is the caller's job.
    pub output_file: PathBuf,
}

/// Launches the `vignette` binary in worker mode.
///
/// Each worker is a full process with an independent configuration
/// singleton: it enters its own scoped configuration around the render and
/// reports the outcome through a one-line JSON record on stdout.
#[derive(Clone, Debug)]
pub struct WorkerLauncher {
    program: PathBuf,
}

impl WorkerLauncher {
    /// Launcher for a specific worker binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Start one worker process.
    pub fn spawn(&self, task: WorkerTask) -> VignetteResult<ProcessHandle> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("render")
            .args(["--process-name", &task.process_name])
            .arg("--out")
            .arg(&task.output_file)
            .arg("--report-json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            name = %task.process_name,
            out = %task.output_file.display(),
            "spawning worker process"
        );
        let mut child = cmd.spawn().map_err(|e| {
            VignetteError::worker(format!(
                "failed to spawn worker '{}': {e}",
                self.program.display()
            ))
        })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VignetteError::worker("failed to open worker stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(ProcessHandle {
            name: task.process_name,
            child,
            stderr_drain,
        })
    }
}

/// A running worker process.
pub struct ProcessHandle {
    name: String,
    child: Child,
    stderr_drain: std::thread::JoinHandle<std::io::Result<Vec<u8>>>,
}

impl ProcessHandle {
    /// Process identity name this worker was started under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the worker to exit and reconstruct its outcome from the
    /// report it printed.
    ///
    /// A worker that exits without a parseable report is a worker error; its
    /// stderr is included for diagnosis.
    pub fn wait(mut self) -> VignetteResult<Artifact> {
        let mut stdout_bytes = Vec::new();
        if let Some(mut out) = self.child.stdout.take() {
            // Drain stdout before waiting so the child cannot block on a full
            // pipe.
            out.read_to_end(&mut stdout_bytes)
                .with_context(|| format!("failed to read stdout of worker '{}'", self.name))?;
        }
        let status = self
            .child
            .wait()
            .with_context(|| format!("failed to wait for worker '{}'", self.name))?;
        let stderr_bytes = match self.stderr_drain.join() {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                return Err(VignetteError::worker(format!(
                    "worker '{}' stderr read failed: {e}",
                    self.name
                )));
            }
            Err(_) => {
                return Err(VignetteError::worker(format!(
                    "worker '{}' stderr drain thread panicked",
                    self.name
                )));
            }
        };

        match WorkerReport::from_stdout(&stdout_bytes) {
            Some(report) => report.into_outcome(),
            None => {
                let stderr = String::from_utf8_lossy(&stderr_bytes);
                Err(VignetteError::worker(format!(
                    "worker '{}' exited with {} without a report: {}",
                    self.name,
                    status,
                    stderr.trim()
                )))
            }
        }
    }
}

/// A batch of worker processes collected at an explicit join barrier.
#[derive(Clone, Debug)]
pub struct ProcessPool {
    launcher: WorkerLauncher,
}

impl ProcessPool {
    /// Pool submitting tasks through `launcher`.
    pub fn new(launcher: WorkerLauncher) -> Self {
        Self { launcher }
    }

    /// Submit every task, then wait for all of them.
    ///
    /// Every spawned worker runs to completion before the first failure is
    /// reported; no outcome is dropped and nothing is retried. Results carry
    /// no ordering guarantee beyond matching the submission order.
    pub fn run_all(&self, tasks: Vec<WorkerTask>) -> VignetteResult<Vec<Artifact>> {
        let mut handles = Vec::with_capacity(tasks.len());
        let mut spawn_failure = None;
        for task in tasks {
            match self.launcher.spawn(task) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    spawn_failure = Some(e);
                    break;
                }
            }
        }

        // Join barrier: collect every outcome before surfacing any error.
        let outcomes: Vec<VignetteResult<Artifact>> =
            handles.into_iter().map(ProcessHandle::wait).collect();
        if let Some(e) = spawn_failure {
            return Err(e);
        }
        outcomes.into_iter().collect()
    }
}

/// One-line JSON record a worker prints on stdout before exiting.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerReport {
    /// The render succeeded.
    Ok {
        /// The finished artifact.
        artifact: Artifact,
    },
    /// The render failed; `kind` keys the error variant to rebuild.
    Error {
        kind: WorkerErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identity: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        found: Option<PathBuf>,
    },
}

/// Error classification carried across the process boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerErrorKind {
    AffinityDenied,
    Configuration,
    ArtifactMismatch,
    Validation,
    Encode,
    Worker,
    Other,
}

impl WorkerReport {
    /// Build the report for an invocation outcome.
    pub fn from_outcome(outcome: &VignetteResult<Artifact>) -> Self {
        match outcome {
            Ok(artifact) => Self::Ok {
                artifact: artifact.clone(),
            },
            Err(err) => {
                let (identity, expected, found) = match err {
                    VignetteError::AffinityDenied { identity } => {
                        (Some(identity.clone()), None, None)
                    }
                    VignetteError::ArtifactMismatch { expected, found } => {
                        (None, Some(expected.clone()), found.clone())
                    }
                    _ => (None, None, None),
                };
                Self::Error {
                    kind: WorkerErrorKind::of(err),
                    message: err.to_string(),
                    identity,
                    expected,
                    found,
                }
            }
        }
    }

    /// Reconstruct the worker-side outcome.
    pub fn into_outcome(self) -> VignetteResult<Artifact> {
        match self {
            Self::Ok { artifact } => Ok(artifact),
            Self::Error {
                kind,
                message,
                identity,
                expected,
                found,
            } => Err(match kind {
                WorkerErrorKind::AffinityDenied => VignetteError::AffinityDenied {
                    identity: identity.unwrap_or_else(|| "<unknown>".to_string()),
                },
                WorkerErrorKind::Configuration => VignetteError::Configuration(message),
                WorkerErrorKind::ArtifactMismatch => VignetteError::ArtifactMismatch {
                    expected: expected.unwrap_or_else(|| PathBuf::from("<unknown>")),
                    found,
                },
                WorkerErrorKind::Validation => VignetteError::Validation(message),
                WorkerErrorKind::Encode => VignetteError::Encode(message),
                WorkerErrorKind::Worker => VignetteError::Worker(message),
                WorkerErrorKind::Other => VignetteError::Other(anyhow::Error::msg(message)),
            }),
        }
    }

    /// Parse the report from raw worker stdout.
    ///
    /// The report is the last non-empty stdout line, so incidental output
    /// cannot shadow it.
    fn from_stdout(bytes: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(bytes);
        let line = text.lines().rev().find(|l| !l.trim().is_empty())?;
        serde_json::from_str(line.trim()).ok()
    }
}

impl WorkerErrorKind {
    fn of(err: &VignetteError) -> Self {
        match err {
            VignetteError::AffinityDenied { .. } => Self::AffinityDenied,
            VignetteError::Configuration(_) => Self::Configuration,
            VignetteError::ArtifactMismatch { .. } => Self::ArtifactMismatch,
            VignetteError::Validation(_) => Self::Validation,
            VignetteError::Encode(_) => Self::Encode,
            VignetteError::Worker(_) => Self::Worker,
            VignetteError::Other(_) => Self::Other,
        }
    }
}
