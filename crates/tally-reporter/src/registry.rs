//! Process-wide statistics switch and the external registry seam.

use std::sync::atomic::{AtomicBool, Ordering};

static STATISTICS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Flips the process-wide statistics switch on. Called by reporter
/// construction; hosts may consult [`statistics_enabled`] to gate their own
/// collection. The switch never turns back off.
pub fn enable_statistics() {
    STATISTICS_ENABLED.store(true, Ordering::Relaxed);
}

pub fn statistics_enabled() -> bool {
    STATISTICS_ENABLED.load(Ordering::Relaxed)
}

/// An external registry the reporter publishes cumulative counters into at
/// finalization, before the stats artifact is written.
pub trait StatsRegistry {
    /// Receives one fully qualified counter key (`"<Schema>.<Name>"`) and
    /// its final value.
    fn publish(&self, key: &str, value: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_statistics_is_sticky() {
        enable_statistics();
        assert!(statistics_enabled());
        enable_statistics();
        assert!(statistics_enabled());
    }
}
