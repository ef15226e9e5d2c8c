//! Node-level plumbing: configuration, logging, and errors.
//!
//! The consensus core lives in `helix-consensus` and the per-block driver
//! in `helix-chain`; this crate wires them up for the `helixd` binary.

pub mod config;
pub mod error;
pub mod logging;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
