//! CPI Search library
//!
//! Cache-first lookup of monthly Consumer Price Index values from the BLS
//! public API. The binary in `main.rs` is a thin CLI over [`retrieval::CpiRetriever`].

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod records;
pub mod retrieval;

pub use error::{RetrievalError, UpstreamError};
pub use retrieval::CpiRetriever;
