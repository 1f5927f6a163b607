//! OS resource-usage queries.
//!
//! On Unix these go through `getrusage`. Elsewhere process CPU time
//! degrades to wall time since first use, and child memory is reported
//! as 0.

/// Accumulated (user, system) CPU time of this process, in microseconds.
#[cfg(unix)]
pub fn process_cpu_times() -> (u64, u64) {
    match rusage(libc::RUSAGE_SELF) {
        Some(ru) => (timeval_us(ru.ru_utime), timeval_us(ru.ru_stime)),
        None => (0, 0),
    }
}

#[cfg(not(unix))]
pub fn process_cpu_times() -> (u64, u64) {
    (wall_since_first_use_us(), 0)
}

/// Total process CPU time (user + system) in microseconds. Event
/// timestamps and span durations are derived from this, not wall time.
pub fn process_time_us() -> u64 {
    let (user, sys) = process_cpu_times();
    user + sys
}

/// Peak resident set size of terminated child processes, in the platform's
/// `ru_maxrss` units (KiB on Linux). 0 where unavailable.
#[cfg(unix)]
pub fn children_max_rss() -> u64 {
    match rusage(libc::RUSAGE_CHILDREN) {
        Some(ru) => ru.ru_maxrss.max(0) as u64,
        None => 0,
    }
}

#[cfg(not(unix))]
pub fn children_max_rss() -> u64 {
    0
}

#[cfg(unix)]
fn rusage(who: libc::c_int) -> Option<libc::rusage> {
    let mut ru = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // Safety: `ru` is a valid, writable rusage buffer for the duration of
    // the call.
    let rc = unsafe { libc::getrusage(who, ru.as_mut_ptr()) };
    if rc == 0 {
        Some(unsafe { ru.assume_init() })
    } else {
        None
    }
}

#[cfg(unix)]
fn timeval_us(tv: libc::timeval) -> u64 {
    tv.tv_sec.max(0) as u64 * 1_000_000 + tv.tv_usec.max(0) as u64
}

#[cfg(not(unix))]
fn wall_since_first_use_us() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static FIRST_USE: OnceLock<Instant> = OnceLock::new();
    FIRST_USE.get_or_init(Instant::now).elapsed().as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_time_is_monotone() {
        let a = process_time_us();
        // Burn a little CPU so the clock has a chance to move.
        let mut x = 0u64;
        for i in 0..200_000u64 {
            x = x.wrapping_add(i).rotate_left(7);
        }
        std::hint::black_box(x);
        let b = process_time_us();
        assert!(b >= a);
    }

    #[test]
    fn test_children_max_rss_does_not_panic() {
        let _ = children_max_rss();
    }
}
