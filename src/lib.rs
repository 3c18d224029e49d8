//! Allervie Analytics API Library
//!
//! Backend for the Allervie marketing dashboard:
//! - Google OAuth login and session tokens
//! - Google Ads reporting proxy (performance, campaigns, ad groups, search terms)
//! - Deterministic mock data when live Google data is disabled or unavailable

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{DataResponse, DataSource, DataSourceSelector, MockData, RequestKind};
pub use models::{AppError, AppResult, Config, Environment, ErrorCode};
pub use providers::{AdsProvider, GoogleAdsClient, GoogleOAuthClient, IdentityProvider};
pub use utils::{SessionStore, SourceTelemetry};
