//! Core types and trait definitions for LearnSpeak journey progress.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Backends implement the capability traits in [`store`]; the services in
//! [`aggregator`], [`status`], [`activity`] and [`enrollment`] are generic
//! over them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod aggregator;
pub mod assignment;
pub mod content;
pub mod enrollment;
pub mod error;
pub mod invitation;
pub mod progress;
pub mod quiz;
pub mod status;
pub mod store;
pub mod time;

pub use error::{Error, Result};

#[cfg(test)]
mod memory;
