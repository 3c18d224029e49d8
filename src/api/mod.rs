//! Allervie Analytics HTTP API
//! Auth, Google Ads proxy, dashboard widgets and diagnostics

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
