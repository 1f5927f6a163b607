//! Trace event records.

use crate::entity::TraceEntity;

/// One emitted record of a counter's change, timestamped and attributed to
/// a named event and an entity.
///
/// Timestamps are process-CPU microseconds, not wall time. `live_us` is 0
/// for entry-side events, otherwise the exit-minus-entry duration of the
/// span that emitted the record.
#[derive(Debug, Clone, Copy)]
pub struct TraceEvent<'a> {
    pub time_us: u64,
    pub live_us: u64,
    pub is_entry: bool,
    pub event_name: &'static str,
    /// Fully qualified counter key, `"<Schema>.<CounterName>"`.
    pub counter_name: &'static str,
    /// Movement since the last emission for this counter. Counters are
    /// monotone while a job is active, so deltas are non-negative.
    pub counter_delta: u64,
    /// Cumulative value at emission time.
    pub counter_value: u64,
    pub entity: TraceEntity<'a>,
}
