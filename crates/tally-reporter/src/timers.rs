//! Timer harness: whole-job time records and per-phase recursive timers.

use std::cell::Cell;
use std::time::Instant;

use crate::sys;

/// A point-in-time capture of wall clock and process CPU time.
#[derive(Debug, Clone, Copy)]
pub struct TimeRecord {
    wall: Instant,
    user_us: u64,
    sys_us: u64,
}

impl TimeRecord {
    pub fn current() -> Self {
        let (user_us, sys_us) = sys::process_cpu_times();
        Self {
            wall: Instant::now(),
            user_us,
            sys_us,
        }
    }

    /// Time elapsed since this record was captured. Never negative by
    /// construction.
    pub fn elapsed(&self) -> ElapsedTime {
        let now = Self::current();
        ElapsedTime {
            wall_us: now.wall.duration_since(self.wall).as_micros() as u64,
            user_us: now.user_us.saturating_sub(self.user_us),
            sys_us: now.sys_us.saturating_sub(self.sys_us),
        }
    }
}

/// An elapsed interval, split into wall and CPU components.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedTime {
    pub wall_us: u64,
    pub user_us: u64,
    pub sys_us: u64,
}

impl ElapsedTime {
    /// Process time (user + system) in microseconds.
    pub fn process_us(&self) -> u64 {
        self.user_us + self.sys_us
    }

    pub fn process_secs(&self) -> f64 {
        self.process_us() as f64 / 1_000_000.0
    }
}

/// A re-entrant phase timer.
///
/// Entering an already-entered timer only bumps a depth counter; time is
/// accumulated when the outermost guard is dropped, so recursive phases
/// are not double-counted.
#[derive(Debug)]
pub struct RecursiveTimer {
    name: &'static str,
    depth: Cell<u32>,
    entered: Cell<Option<TimeRecord>>,
    total_wall_us: Cell<u64>,
    total_process_us: Cell<u64>,
}

impl RecursiveTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            depth: Cell::new(0),
            entered: Cell::new(None),
            total_wall_us: Cell::new(0),
            total_process_us: Cell::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enters the phase, returning a guard that exits it on drop.
    pub fn enter(&self) -> RecursiveTimerGuard<'_> {
        if self.depth.get() == 0 {
            self.entered.set(Some(TimeRecord::current()));
        }
        self.depth.set(self.depth.get() + 1);
        RecursiveTimerGuard { timer: self }
    }

    pub fn total_wall_us(&self) -> u64 {
        self.total_wall_us.get()
    }

    pub fn total_process_us(&self) -> u64 {
        self.total_process_us.get()
    }
}

pub struct RecursiveTimerGuard<'t> {
    timer: &'t RecursiveTimer,
}

impl Drop for RecursiveTimerGuard<'_> {
    fn drop(&mut self) {
        let t = self.timer;
        t.depth.set(t.depth.get().saturating_sub(1));
        if t.depth.get() == 0 {
            if let Some(start) = t.entered.take() {
                let elapsed = start.elapsed();
                t.total_wall_us.set(t.total_wall_us.get() + elapsed.wall_us);
                t.total_process_us
                    .set(t.total_process_us.get() + elapsed.process_us());
            }
        }
    }
}

macro_rules! timer_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $tname:literal => $field:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name {
            $( pub $field: RecursiveTimer, )+
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    $( $field: RecursiveTimer::new($tname), )+
                }
            }

            /// Timers in declaration order.
            pub fn timers(&self) -> impl Iterator<Item = &RecursiveTimer> + '_ {
                [$( &self.$field, )+].into_iter()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

timer_schema! {
    /// Named recursive timers for the frontend's logical phases, lazily
    /// allocated per reporter.
    pub struct FrontendPhaseTimers {
        "Parsing" => parsing,
        "NameBinding" => name_binding,
        "TypeChecking" => type_checking,
        "CodeGen" => code_gen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_nonzero_wall() {
        let start = TimeRecord::current();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let elapsed = start.elapsed();
        assert!(elapsed.wall_us >= 5_000);
    }

    #[test]
    fn test_recursive_enter_accumulates_once() {
        let timer = RecursiveTimer::new("Parsing");
        {
            let _outer = timer.enter();
            std::thread::sleep(std::time::Duration::from_millis(4));
            {
                let _inner = timer.enter();
                std::thread::sleep(std::time::Duration::from_millis(4));
            }
            // Inner guard dropping must not have accumulated anything yet.
            assert_eq!(timer.total_wall_us(), 0);
        }
        // One accumulation covering the whole outer interval.
        assert!(timer.total_wall_us() >= 8_000);
    }

    #[test]
    fn test_sequential_intervals_add_up() {
        let timer = RecursiveTimer::new("CodeGen");
        for _ in 0..2 {
            let _g = timer.enter();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(timer.total_wall_us() >= 4_000);
    }

    #[test]
    fn test_phase_timer_declaration_order() {
        let phases = FrontendPhaseTimers::new();
        let names: Vec<&str> = phases.timers().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Parsing", "NameBinding", "TypeChecking", "CodeGen"]);
    }
}
