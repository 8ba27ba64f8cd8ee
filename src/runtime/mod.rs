//! Runtime assembly: configuration, graph construction and the event loop.
//!
//! [`GraphRuntime`] is the entry point. Configure it, [`start`] it, then
//! drive it through the returned [`RuntimeHandle`] with host commands.
//!
//! [`start`]: GraphRuntime::start

pub mod config;
mod instantiator;
mod runner;

pub use config::{BusConfig, RuntimeConfig, TimingConfig};
pub use runner::{GraphRuntime, RuntimeError, RuntimeHandle};
