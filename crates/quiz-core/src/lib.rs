//! Core types and the fixture-loading pipeline for the quiz content store.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::QuizStore`]; everything above that seam (taxonomy
//! resolution, the question upsert synchronizer, batch planning and loading)
//! lives here and is generic over the backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod fixture;
pub mod loader;
pub mod model;
pub mod plan;
pub mod store;
pub mod sync;
pub mod taxonomy;

pub use error::{Error, Result};
