//! Library crate for port-scan-rs exposing reusable modules.
pub mod config;
pub mod error;
pub mod probe;
pub mod scanner;
pub mod services;
pub mod types;

pub use config::ScanConfig;
pub use error::ScanError;
pub use types::{PortResult, PortState, ScanUpdate};
