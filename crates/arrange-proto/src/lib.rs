//! Shared vocabulary between the arrangement front-end and the native
//! audio backend: channel envelopes, event payloads, commands, the framing
//! codec, boundary errors and configuration.

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod platform;
pub mod protocol;
