//! Vignette renders short animated scenes into multi-frame artifacts and
//! guards every render invocation behind a thread-affinity check.
//!
//! The rendering backend binds to the execution context that first touches it,
//! so a render may only be driven from the thread that owns the backend (the
//! sentinel identity `MainThread`) or from a worker process, which owns a
//! backend of its own. The public API is built around three pieces:
//!
//! - [`ScopedConfig`]: a temporary, restorable override of the process-wide
//!   render configuration (notably the output path)
//! - [`RenderPermit`]: a capability proving the caller's execution context is
//!   allowed to render
//! - [`dispatch`]: composition of render invocations across direct calls,
//!   named threads, worker processes, and nested pool hierarchies
#![forbid(unsafe_code)]

pub mod affinity;
pub mod animation;
pub mod config;
pub mod dispatch;
pub mod encode;
pub mod foundation;
pub mod render;
pub mod scene;

pub use crate::affinity::{ContextKind, ExecutionContext, MAIN_CONTEXT_NAME, RenderPermit};
pub use crate::config::{
    ConfigDelta, ConfigKey, ConfigValue, EncoderKind, RenderConfig, ScopedConfig,
};
pub use crate::encode::container::{ContainerHeader, read_header};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{VignetteError, VignetteResult};
pub use crate::render::raster::Frame;
pub use crate::render::session::{Artifact, RenderSession, RenderStats};
pub use crate::scene::model::{Playback, Scene, SceneSpec};
