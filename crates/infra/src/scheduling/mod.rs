//! Cron-driven execution of scheduler ticks
//!
//! The daemon mode of the CLI owns one [`FetchScheduler`]. It follows the
//! same lifecycle rules as every long-running task here:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod error;
pub mod fetch_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use fetch_scheduler::{FetchScheduler, FetchSchedulerConfig, TickJob};
