//! Background Tasks Module
//!
//! Contains the tasks that run alongside cache operations.
//!
//! # Tasks
//! - TTL Expiry: deletes a key once its time-to-live has elapsed

mod expiry;

pub use expiry::{runtime_handle, ExpiryTimers};
