//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bounded-wait accept, shutdown flag checked between waits)
//!     → connection.rs (ID + in-flight tracking)
//!     → Hand off to HTTP layer on its own task
//! ```
//!
//! # Design Decisions
//! - Accept never blocks longer than the poll interval
//! - Each connection tracked so shutdown can drain it

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
