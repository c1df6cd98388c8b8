//! mediabroker - storage quota and file token broker
//!
//! Backend API that brokers file uploads, per-user storage accounting and
//! file metadata between a frontend and an external storage/encoding server.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod quota;
pub mod rate_limit;
pub mod remote;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{BrokerError, Result};
pub use quota::Plan;
pub use remote::{HttpRemoteStorage, RemoteStorage};
pub use web::WebServer;
