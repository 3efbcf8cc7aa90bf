//! Front-end orchestration for the arrangement tool.
//!
//! One [`core::Orchestrator`] task owns all application state.  Input
//! changes, backend channel messages, command continuations and debounce
//! timers all arrive as [`core::CoreEvent`]s on a single queue and are
//! folded in one at a time.

pub mod backend;
pub mod core;
pub mod debounce;
pub mod fingerprint;
pub mod intent;
pub mod invoke;
pub mod metrics;
pub mod reducers;
pub mod remote;
pub mod state;
pub mod svg;
pub mod view;
