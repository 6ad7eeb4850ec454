//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Install signals → Bind listener → Serve
//!     → self_check.rs probes the port once, in the background
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → set shutdown flag
//!
//! Shutdown (shutdown.rs):
//!     Flag set → accept loop exits → listener dropped → drain → return
//! ```
//!
//! # Design Decisions
//! - Signals never exit the process directly; they only set the flag
//! - Drain has a deadline; the process exits after it regardless

pub mod self_check;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
