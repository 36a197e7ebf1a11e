//! Application layer containing the marketplace orchestration.
//!
//! `Marketplace` owns the injected stores and is the single entry point for
//! the job lifecycle, the completion handshake, payments, messaging and
//! dashboard summaries.

pub mod completion;
pub mod marketplace;
pub mod messaging;
pub mod summary;
