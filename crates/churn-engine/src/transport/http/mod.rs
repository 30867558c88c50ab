//! HTTP transport: axum router and server loop.

mod routes;
mod server;

pub use routes::{DeploymentList, HealthCheckResponse, routes};
pub use server::{ServerConfig, serve};
