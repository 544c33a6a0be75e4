//! Gateway Module
//!
//! The HTTP surface consumed by the UI.
//!
//! ## Architecture
//! - axum router, one route per operation
//! - [`CommandGateway`] validates input and calls the transport once
//! - Every outcome becomes an [`Envelope`]

mod envelope;
mod service;
mod routes;
mod server;

pub use envelope::Envelope;
pub use service::{CommandGateway, DEFAULT_INDICATOR};
pub use routes::router;
pub use server::HttpServer;
