//! Core Module - Data Source Selection & Metrics
//!
//! Live-vs-mock policy, deterministic synthetic payloads and the
//! arithmetic behind the performance endpoint.

pub mod metrics;
pub mod mock_data;
pub mod selector;

pub use metrics::*;
pub use mock_data::*;
pub use selector::*;
