// src/lib.rs

//! colle: feed ingestion and ranked retrieval.
//!
//! Feeds are fetched, deduplicated by link, optionally enriched from a
//! keyword dictionary, and stored with time and click-rank indexes in a
//! key-value store (Redis, or in memory).

pub mod context;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use context::AppContext;
pub use error::{AppError, Result};
