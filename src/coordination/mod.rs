//! Coordination layer
//!
//! Shared cancellation for the polling loop and every retry wait.

pub mod shutdown;

pub use shutdown::{install_signal_handlers, GracefulShutdown, ShutdownSignal, ShutdownToken};
