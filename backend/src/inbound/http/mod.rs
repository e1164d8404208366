//! HTTP inbound adapter exposing the account REST endpoints.

pub mod accounts;
pub mod error;
pub mod state;
pub mod validation;

pub use error::ApiResult;
