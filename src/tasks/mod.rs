//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries, read or not, at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
