// src/lib.rs
// Public library surface for integration tests and the Shuttle binary.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod proxy;

pub use crate::api::router;
pub use crate::error::CoreError;
