//! Unified statistics reporting for batch compilation jobs.
//!
//! A [`StatsReporter`] accumulates named counters and timers across the
//! driver and frontend subsystems of one compilation job and, optionally,
//! records a time-ordered trace of counter deltas attributed to scoped
//! work items. When the reporter is dropped it serializes a cumulative
//! JSON snapshot and, if tracing was enabled, a CSV trace of every
//! buffered event.
//!
//! The reporter is single-threaded: one instance per job, owned and
//! mutated by the thread running that job. Counter sets live behind
//! `RefCell`s so business logic can bump counters while tracer spans are
//! open; accessors hand out short-lived guards that must not be held
//! across a call back into the reporter.

pub mod filename;
pub mod output;
pub mod registry;
pub mod sys;
pub mod timers;

mod tracer;

use std::cell::{Cell, OnceCell, RefCell, RefMut};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tally_core::counters::{DriverCounters, FrontendCounters};
use tally_core::entity::{LocationResolver, TraceEntity};
use tally_core::event::TraceEvent;
use tally_core::Error;

use crate::registry::StatsRegistry;
use crate::timers::{ElapsedTime, FrontendPhaseTimers, TimeRecord};

pub use tracer::StatsTracer;

/// Identifying parts of one compilation, used to derive the auxiliary name
/// that keeps artifact files distinguishable per unit/target.
#[derive(Debug, Clone, Default)]
pub struct CompilationInfo {
    pub module_name: String,
    /// Primary input path; empty means a whole-module job ("all").
    pub input_name: String,
    pub target_triple: String,
    /// Output file type, with or without the leading dot.
    pub output_type: String,
    /// Optimization flag, with or without the leading dash; empty means
    /// unoptimized.
    pub opt_type: String,
}

impl CompilationInfo {
    pub fn aux_name(&self) -> String {
        filename::aux_name(
            &self.module_name,
            &self.input_name,
            &self.target_triple,
            &self.output_type,
            &self.opt_type,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReporterState {
    Active,
    Finalizing,
    Closed,
}

/// The top-level statistics aggregate for one compilation job.
///
/// The lifetime parameter bounds every borrowed collaborator: traced
/// entities, the location resolver and the external registry must all
/// outlive the reporter, which is what lets buffered trace events render
/// entity names at finalization without owning them.
pub struct StatsReporter<'a> {
    stats_path: PathBuf,
    trace_path: PathBuf,
    started: TimeRecord,
    frontend: RefCell<Option<Box<FrontendCounters>>>,
    driver: RefCell<Option<Box<DriverCounters>>>,
    phase_timers: OnceCell<Box<FrontendPhaseTimers>>,
    /// Counter values as of the most recent event emission. `Some` iff
    /// event tracing is enabled.
    last_traced: Option<RefCell<Box<FrontendCounters>>>,
    events: RefCell<Vec<TraceEvent<'a>>>,
    resolver: Option<&'a dyn LocationResolver>,
    registry: Option<&'a dyn StatsRegistry>,
    exit_status: Cell<Option<i32>>,
    state: Cell<ReporterState>,
}

impl<'a> StatsReporter<'a> {
    /// Creates an active reporter writing its artifacts under `directory`.
    ///
    /// Derives both artifact file names up front, starts the job timer and
    /// flips the process-wide statistics switch. When `trace_events` is
    /// set, the last-known counter snapshot is initialized to all zeros.
    pub fn new(
        program_name: &str,
        aux_name: &str,
        directory: impl AsRef<Path>,
        resolver: Option<&'a dyn LocationResolver>,
        trace_events: bool,
    ) -> Self {
        let directory = directory.as_ref();
        let stats_path = directory.join(filename::make_stats_file_name(program_name, aux_name));
        let trace_path = directory.join(filename::make_trace_file_name(program_name, aux_name));
        registry::enable_statistics();
        tracing::debug!(
            stats = %stats_path.display(),
            trace_events,
            "stats reporter active"
        );
        Self {
            stats_path,
            trace_path,
            started: TimeRecord::current(),
            frontend: RefCell::new(None),
            driver: RefCell::new(None),
            phase_timers: OnceCell::new(),
            last_traced: trace_events.then(|| RefCell::new(Box::default())),
            events: RefCell::new(Vec::new()),
            resolver,
            registry: None,
            exit_status: Cell::new(None),
            state: Cell::new(ReporterState::Active),
        }
    }

    /// Like [`new`](Self::new), deriving the auxiliary name from the
    /// compilation's identifying parts.
    pub fn with_compilation_info(
        program_name: &str,
        info: &CompilationInfo,
        directory: impl AsRef<Path>,
        resolver: Option<&'a dyn LocationResolver>,
        trace_events: bool,
    ) -> Self {
        Self::new(
            program_name,
            &info.aux_name(),
            directory,
            resolver,
            trace_events,
        )
    }

    /// Attaches an external registry that receives every counter at
    /// finalization.
    pub fn attach_registry(&mut self, registry: &'a dyn StatsRegistry) {
        self.registry = Some(registry);
    }

    /// The frontend counter set, allocated on first access.
    ///
    /// The returned guard is short-lived; do not hold it across a call
    /// back into the reporter (e.g. [`tracer`](Self::tracer)).
    pub fn frontend_counters(&self) -> RefMut<'_, FrontendCounters> {
        RefMut::map(self.frontend.borrow_mut(), |c| {
            &mut **c.get_or_insert_with(Box::default)
        })
    }

    /// The driver counter set, allocated on first access.
    pub fn driver_counters(&self) -> RefMut<'_, DriverCounters> {
        RefMut::map(self.driver.borrow_mut(), |c| {
            &mut **c.get_or_insert_with(Box::default)
        })
    }

    /// The frontend's named recursive phase timers, allocated on first
    /// access.
    pub fn frontend_phase_timers(&self) -> &FrontendPhaseTimers {
        self.phase_timers.get_or_init(Box::default)
    }

    /// Whether event tracing was requested at construction.
    pub fn trace_events_enabled(&self) -> bool {
        self.last_traced.is_some()
    }

    pub fn stats_file_path(&self) -> &Path {
        &self.stats_path
    }

    pub fn trace_file_path(&self) -> &Path {
        &self.trace_path
    }

    /// Records the process exit status; 0 marks the job successful. A job
    /// whose reporter never observes a success increments
    /// `NumProcessFailures` at finalization.
    ///
    /// Setting the status twice is a programmer error.
    pub fn note_process_exit_status(&self, status: i32) {
        debug_assert!(
            self.exit_status.get().is_none(),
            "process exit status already set"
        );
        self.exit_status.set(Some(status));
    }

    /// Opens a tracer span for one unit of work.
    ///
    /// Returns the inert variant when tracing is disabled; otherwise the
    /// entry capture runs immediately, which may emit events for counter
    /// movement that happened in a sibling scope since the last emission.
    pub fn tracer<'r>(
        &'r self,
        event_name: &'static str,
        entity: TraceEntity<'a>,
    ) -> StatsTracer<'r, 'a> {
        if self.last_traced.is_some() {
            StatsTracer::live(self, event_name, entity)
        } else {
            StatsTracer::inert()
        }
    }

    /// Diffs every frontend counter against the last-known snapshot and
    /// appends one event per moved counter, updating the snapshot as it
    /// goes. Unchanged counters emit nothing.
    pub(crate) fn save_frontend_stats_events(
        &self,
        event_name: &'static str,
        entity: TraceEntity<'a>,
        saved_time_us: u64,
        is_entry: bool,
    ) {
        let Some(last_traced) = &self.last_traced else {
            return;
        };
        let now_us = sys::process_time_us();
        let live_us = if is_entry {
            0
        } else {
            now_us.saturating_sub(saved_time_us)
        };
        let counters = self.frontend_counters();
        let mut last = last_traced.borrow_mut();
        let mut events = self.events.borrow_mut();
        for field in FrontendCounters::FIELDS {
            let total = (field.get)(&*counters);
            let previous = (field.get)(&**last);
            if total != previous {
                (field.set)(&mut **last, total);
                events.push(TraceEvent {
                    time_us: now_us,
                    live_us,
                    is_entry,
                    event_name,
                    counter_name: field.name,
                    counter_delta: total.saturating_sub(previous),
                    counter_value: total,
                    entity,
                });
            }
        }
    }

    fn timer_entries(&self, elapsed: &ElapsedTime) -> Vec<(String, u64)> {
        let mut entries = vec![
            ("time.totals.wall".to_string(), elapsed.wall_us),
            ("time.totals.process".to_string(), elapsed.process_us()),
        ];
        if let Some(phases) = self.phase_timers.get() {
            for timer in phases.timers() {
                entries.push((
                    format!("time.phase.{}.wall", timer.name()),
                    timer.total_wall_us(),
                ));
                entries.push((
                    format!("time.phase.{}.process", timer.name()),
                    timer.total_process_us(),
                ));
            }
        }
        entries
    }

    fn publish_counters(&self, registry: &dyn StatsRegistry) {
        if let Some(c) = self.frontend.borrow().as_deref() {
            for field in FrontendCounters::FIELDS {
                registry.publish(field.name, (field.get)(c));
            }
        }
        if let Some(c) = self.driver.borrow().as_deref() {
            for field in DriverCounters::FIELDS {
                registry.publish(field.name, (field.get)(c));
            }
        }
    }

    fn finalize(&mut self) {
        if self.state.get() != ReporterState::Active {
            return;
        }
        self.state.set(ReporterState::Finalizing);
        self.run_finalize();
        self.state.set(ReporterState::Closed);
    }

    fn run_finalize(&mut self) {
        tracing::debug!(stats = %self.stats_path.display(), "finalizing stats reporter");

        // A job nobody marked successful counts as a failure, attributed
        // to the frontend set when it exists, else the driver set.
        if self.exit_status.get() != Some(0) {
            if self.frontend.borrow().is_some() {
                self.frontend_counters().num_process_failures += 1;
            } else {
                self.driver_counters().num_process_failures += 1;
            }
        }

        let elapsed = self.started.elapsed();

        if self.driver.borrow().is_some() {
            self.driver_counters().children_max_rss = sys::children_max_rss();
        }
        if self.frontend.borrow().is_some() {
            let mut c = self.frontend_counters();
            // Crude top-level "absolute speed" figure.
            if c.num_source_lines != 0 && elapsed.process_secs() > 0.0 {
                c.num_source_lines_per_second =
                    (c.num_source_lines as f64 / elapsed.process_secs()) as u64;
            }
        }

        let mut stats_file = match OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.stats_path)
        {
            Ok(f) => f,
            Err(source) => {
                let err = Error::StatsFileOpen {
                    path: self.stats_path.clone(),
                    source,
                };
                tracing::error!(error = %err, "skipping stats and trace artifacts");
                return;
            }
        };

        if let Some(registry) = self.registry {
            self.publish_counters(registry);
        }

        let timer_entries = self.timer_entries(&elapsed);
        {
            let frontend = self.frontend.borrow();
            let driver = self.driver.borrow();
            if let Err(err) = output::write_stats_json(
                &mut stats_file,
                frontend.as_deref(),
                driver.as_deref(),
                &timer_entries,
            ) {
                tracing::error!(error = %err, "failed writing stats artifact");
                return;
            }
        }

        // The trace artifact needs both tracing and a resolver; without a
        // resolver the range column could never be populated.
        if self.last_traced.is_none() {
            return;
        }
        let Some(resolver) = self.resolver else {
            return;
        };
        let mut trace_file = match OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.trace_path)
        {
            Ok(f) => f,
            Err(source) => {
                let err = Error::TraceFileOpen {
                    path: self.trace_path.clone(),
                    source,
                };
                tracing::error!(error = %err, "skipping trace artifact");
                return;
            }
        };
        let events = self.events.borrow();
        if let Err(err) = output::write_trace_csv(&mut trace_file, &events, Some(resolver)) {
            tracing::error!(error = %err, "failed writing trace artifact");
        }
    }
}

impl Drop for StatsReporter<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}
