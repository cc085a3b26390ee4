//! Process-wide render configuration and scoped overrides.
//!
//! All threads in one process share a single [`RenderConfig`]; every worker
//! process owns an independent copy. The configuration is read by the render
//! session when finalizing an artifact, and is only ever mutated through a
//! [`ScopedConfig`], which rewrites selected options for the duration of a
//! scope and restores them on every exit path.

mod scoped;

pub use scoped::ScopedConfig;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::foundation::error::{VignetteError, VignetteResult};

/// Sink implementation used to write the artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderKind {
    /// Raw multi-frame container (no external tools).
    Raw,
    /// MP4 via the system `ffmpeg`.
    Mp4,
}

/// Process-wide render configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Artifact path the next render writes to.
    pub output_file: PathBuf,
    /// Sink used to encode the artifact.
    pub encoder: EncoderKind,
    /// Overwrite an existing artifact instead of failing.
    pub overwrite: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("media/output.vgc"),
            encoder: EncoderKind::Raw,
            overwrite: true,
        }
    }
}

impl RenderConfig {
    /// Apply a single option, returning the prior value.
    pub(crate) fn set(&mut self, key: ConfigKey, value: ConfigValue) -> VignetteResult<ConfigValue> {
        match (key, value) {
            (ConfigKey::OutputFile, ConfigValue::Path(p)) => Ok(ConfigValue::Path(
                std::mem::replace(&mut self.output_file, p),
            )),
            (ConfigKey::Encoder, ConfigValue::Encoder(e)) => Ok(ConfigValue::Encoder(
                std::mem::replace(&mut self.encoder, e),
            )),
            (ConfigKey::Overwrite, ConfigValue::Bool(b)) => Ok(ConfigValue::Bool(
                std::mem::replace(&mut self.overwrite, b),
            )),
            (key, value) => Err(VignetteError::configuration(format!(
                "option '{}' cannot hold {value:?}",
                key.name()
            ))),
        }
    }
}

/// Recognized configuration option names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigKey {
    /// Artifact output path.
    OutputFile,
    /// Encoder selection.
    Encoder,
    /// Overwrite behavior.
    Overwrite,
}

impl ConfigKey {
    /// Option name as it appears in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::OutputFile => "output_file",
            Self::Encoder => "encoder",
            Self::Overwrite => "overwrite",
        }
    }
}

/// A typed value for a configuration option.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Path(PathBuf),
    Encoder(EncoderKind),
    Bool(bool),
}

/// An option→value mapping applied by [`ScopedConfig::enter`].
///
/// Only the options present in the delta are overridden; everything else is
/// left untouched and is not restored on exit.
#[derive(Clone, Debug, Default)]
pub struct ConfigDelta {
    entries: BTreeMap<ConfigKey, ConfigValue>,
}

impl ConfigDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an override for `key`.
    pub fn set(mut self, key: ConfigKey, value: ConfigValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Override the artifact output path.
    pub fn output_file(self, path: impl Into<PathBuf>) -> Self {
        self.set(ConfigKey::OutputFile, ConfigValue::Path(path.into()))
    }

    /// Override the encoder selection.
    pub fn encoder(self, encoder: EncoderKind) -> Self {
        self.set(ConfigKey::Encoder, ConfigValue::Encoder(encoder))
    }

    /// Override the overwrite behavior.
    pub fn overwrite(self, overwrite: bool) -> Self {
        self.set(ConfigKey::Overwrite, ConfigValue::Bool(overwrite))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, key: ConfigKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigValue)> {
        self.entries.iter()
    }
}

pub(crate) fn store() -> &'static RwLock<RenderConfig> {
    static STORE: OnceLock<RwLock<RenderConfig>> = OnceLock::new();
    STORE.get_or_init(|| RwLock::new(RenderConfig::default()))
}

/// Copy of the current process-wide configuration.
pub fn snapshot() -> RenderConfig {
    store()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
