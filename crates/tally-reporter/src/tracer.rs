//! Scoped tracing of counter deltas.

use tally_core::entity::TraceEntity;

use crate::sys;
use crate::StatsReporter;

/// A scope-bound tracer attributed to a named event and an entity.
///
/// Construction performs the entry capture (diffing every frontend counter
/// against the reporter's last-known snapshot), dropping performs the exit
/// capture. The inert variant, handed out when tracing is disabled, does
/// neither.
///
/// Moving a tracer transfers responsibility for the exit capture with it;
/// since a moved-from value in Rust is simply gone, exactly one exit
/// capture happens per logical span.
pub struct StatsTracer<'r, 'a> {
    reporter: Option<&'r StatsReporter<'a>>,
    saved_time_us: u64,
    event_name: &'static str,
    entity: TraceEntity<'a>,
}

impl<'r, 'a> StatsTracer<'r, 'a> {
    pub(crate) fn live(
        reporter: &'r StatsReporter<'a>,
        event_name: &'static str,
        entity: TraceEntity<'a>,
    ) -> Self {
        let tracer = Self {
            reporter: Some(reporter),
            saved_time_us: sys::process_time_us(),
            event_name,
            entity,
        };
        reporter.save_frontend_stats_events(event_name, entity, tracer.saved_time_us, true);
        tracer
    }

    /// The no-cost variant used when event tracing is disabled.
    pub fn inert() -> Self {
        Self {
            reporter: None,
            saved_time_us: 0,
            event_name: "",
            entity: TraceEntity::None,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.reporter.is_none()
    }

    pub fn event_name(&self) -> &'static str {
        self.event_name
    }
}

impl Drop for StatsTracer<'_, '_> {
    fn drop(&mut self) {
        if let Some(reporter) = self.reporter {
            reporter.save_frontend_stats_events(
                self.event_name,
                self.entity,
                self.saved_time_us,
                false,
            );
        }
    }
}
