//! Scheduled fetch path: circuit breaker gate, controller and trigger
//!
//! ```text
//! SchedulerTrigger::tick
//!   ├──► CircuitBreakerController::begin_attempt   (gate + claim last_run)
//!   ├──► TokenSource::valid_token
//!   ├──► FetchPipeline::run                         (under deadline)
//!   └──► CircuitBreakerController::record_outcome  (conditional write)
//! ```

pub mod circuit;
pub mod controller;
pub mod ports;
pub mod trigger;

pub use circuit::{GateDecision, SkipReason};
pub use controller::{Admission, AttemptTicket, CircuitBreakerController, RecordResult};
pub use ports::{FetchPipeline, PipelineError, SchedulerStateStore};
pub use trigger::{SchedulerTrigger, TickReport};
