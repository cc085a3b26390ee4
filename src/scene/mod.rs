//! Scene content: what a render invocation draws.
//!
//! Scenes are deliberately small. The load-bearing machinery lives in
//! [`crate::affinity`], [`crate::config`], and [`crate::dispatch`]; the scene
//! is the collaborator they exercise.

pub mod model;
