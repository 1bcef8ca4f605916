//! Background tasks for the routing layer.
//!
//! # Tasks
//!
//! - `session_sweeper` - Evicts registry sessions that have gone idle

pub mod session_sweeper;

pub use session_sweeper::{start_session_sweeper, SessionSweeperConfig};
