//! Core types and counter schemas for the Tally statistics toolkit.
//!
//! This crate defines the foundational data structures shared across the
//! Tally system: the declarative counter schemas for the driver and
//! frontend subsystems, the trace-event record, the traced-entity model,
//! and error types. It contains no I/O and no clocks; the reporting engine
//! lives in `tally-reporter`.

pub mod counters;
pub mod entity;
pub mod error;
pub mod event;

pub use counters::{CounterField, DriverCounters, FrontendCounters};
pub use entity::{LocationResolver, SourceLoc, SourceRange, TraceEntity};
pub use error::{Error, Result};
pub use event::TraceEvent;
