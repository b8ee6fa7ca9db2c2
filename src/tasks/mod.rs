//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache provider.
//!
//! # Tasks
//! - Expiry sweeper: removes in-process entries at their expiry instant
//! - Housekeeping: flushes the temporary namespace at a fixed interval

mod housekeeping;
mod sweeper;

pub use housekeeping::spawn_housekeeping_task;
pub use sweeper::spawn_expiry_sweeper;
