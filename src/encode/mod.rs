//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order; the configured
//! [`EncoderKind`](crate::config::EncoderKind) selects which one a render
//! session writes through.

/// Raw multi-frame container format.
pub mod container;
/// MP4 output via the system `ffmpeg`.
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
