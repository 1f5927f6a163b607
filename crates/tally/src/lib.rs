//! Tally: unified statistics and event tracing for batch compilation jobs.
//!
//! This is the main entry point for host compilers. It re-exports the core
//! types and the reporting engine from the other Tally crates.
//!
//! A host creates one [`StatsReporter`] per job, bumps counters on it while
//! the job runs, wraps interesting units of work in tracer spans, and drops
//! the reporter at job end to write the stats and trace artifacts.

pub use tally_core as core;

pub use tally_reporter::{
    registry::{enable_statistics, statistics_enabled, StatsRegistry},
    CompilationInfo, StatsReporter, StatsTracer,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        counters::{CounterField, DriverCounters, FrontendCounters},
        entity::{
            LocationResolver, SourceLoc, SourceRange, TraceEntity, TracedDecl, TracedExpr,
            TracedFunction,
        },
        event::TraceEvent,
        Error, Result,
    };

    pub use tally_reporter::{
        filename::aux_name,
        timers::{ElapsedTime, FrontendPhaseTimers, RecursiveTimer, TimeRecord},
        CompilationInfo, StatsReporter, StatsTracer,
    };
}
