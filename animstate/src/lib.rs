//! Track-based animation playback state: queueing, crossfades and lifecycle
//! notifications (`start`, `interrupt`, `event`, `complete`, `end`).
//!
//! This crate only drives time. Posing is delegated to a caller-provided
//! [`PoseTarget`].

#![forbid(unsafe_code)]

mod error;
mod model;
mod runtime;

pub use error::*;
pub use model::*;
pub use runtime::*;
