//! Utils Module - Shared Helpers
//!
//! Constants, session tokens and data-source telemetry.

pub mod constants;
pub mod session;
pub mod telemetry;

pub use constants::*;
pub use session::*;
pub use telemetry::*;
