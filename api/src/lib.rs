//! Client side of the SDE Wrapped session gateway.
//!
//! The gateway owns GitHub OAuth, the session cookie and the aggregated
//! profile data. This crate only knows its three endpoints and the shape of
//! the summary it returns.

mod config;
mod gateway;
mod model;

pub use config::{GatewayConfig, DEFAULT_GATEWAY_URL, GATEWAY_URL_VAR};
pub use gateway::{FetchOutcome, GatewayError, HttpGateway, SessionGateway};
pub use model::ProfileSummary;
