//! Web API for mediabroker.
//!
//! HTTP surface between the frontend and the broker workflows. Handlers are
//! thin: they parse the request, run a coordinator and map the outcome or
//! error to the wire format.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
