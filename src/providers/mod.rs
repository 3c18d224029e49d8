//! Providers Module - External Data Sources
//!
//! Google Ads reporting and Google identity, each behind a trait so the
//! HTTP layer can run against fakes.

pub mod google_ads;
pub mod google_oauth;

pub use google_ads::*;
pub use google_oauth::*;
