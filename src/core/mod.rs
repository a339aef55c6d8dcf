// Public modules
pub mod cleanup;
pub mod config;
pub mod credentials;
pub mod error;
pub mod install;
pub mod kube;
pub mod paths;
pub mod postgres;
pub mod refresh;
pub mod runner;
pub mod session;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
