use crate::error::{EmuError, Result};
use crate::scheduler::{FiredTimer, Scheduler};
use crate::time::Attotime;

/// A complete emulated system driven by one scheduler.
///
/// Implementors own their devices and the scheduler; `run_until` provides
/// the cooperative loop that interleaves device execution with timer
/// callbacks.
pub trait Machine {
    fn scheduler(&self) -> &Scheduler;
    fn scheduler_mut(&mut self) -> &mut Scheduler;

    /// Run every executable device from the current time towards `horizon`
    /// and return the time actually reached. Devices may stop early when
    /// the timeslice is aborted, or overshoot by part of an instruction.
    fn execute(&mut self, horizon: Attotime) -> Result<Attotime>;

    /// Dispatch an expired timer to its owner.
    fn timer_expired(&mut self, timer: FiredTimer) -> Result<()>;

    /// Advance the machine to `target`.
    ///
    /// Every timer with a deadline at or before `target` fires exactly once,
    /// in deadline order, with ties broken by arm order.
    fn run_until(&mut self, target: Attotime) -> Result<()> {
        loop {
            let now = self.scheduler().now();
            while let Some(fired) = self.scheduler_mut().fire_next(now) {
                self.timer_expired(fired)?;
            }
            if now >= target {
                return Ok(());
            }

            let horizon = self.scheduler().next_expiry().min(target);
            self.scheduler_mut().begin_timeslice(horizon);
            let reached = self.execute(horizon);
            let aborted = self.scheduler_mut().end_timeslice();
            let reached = reached?.min(horizon);

            if reached <= now && !aborted {
                log::error!("machine stalled at {now} (horizon {horizon})");
                return Err(EmuError::NoProgress { at: now, horizon });
            }
            self.scheduler_mut().advance_to(reached);
        }
    }

    fn run_for(&mut self, duration: Attotime) -> Result<()> {
        let target = self.scheduler().now() + duration;
        self.run_until(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TimerId;

    /// A machine whose only device executes in fixed-size steps.
    struct StepMachine {
        sched: Scheduler,
        step: Attotime,
        local: Attotime,
        fired: Vec<(TimerId, Attotime)>,
        rearm: Option<TimerId>,
        stalled: bool,
    }

    impl StepMachine {
        fn new(step: Attotime) -> Self {
            Self {
                sched: Scheduler::new(),
                step,
                local: Attotime::ZERO,
                fired: Vec::new(),
                rearm: None,
                stalled: false,
            }
        }
    }

    impl Machine for StepMachine {
        fn scheduler(&self) -> &Scheduler {
            &self.sched
        }

        fn scheduler_mut(&mut self) -> &mut Scheduler {
            &mut self.sched
        }

        fn execute(&mut self, horizon: Attotime) -> Result<Attotime> {
            if self.stalled {
                return Ok(self.local);
            }
            while self.local < horizon {
                self.local += self.step;
                self.sched.set_local_time(self.local);
                if self.sched.timeslice_aborted() {
                    break;
                }
            }
            Ok(self.local)
        }

        fn timer_expired(&mut self, timer: FiredTimer) -> Result<()> {
            assert_eq!(self.sched.now(), timer.expire);
            self.fired.push((timer.id, timer.expire));
            if self.rearm == Some(timer.id) {
                self.sched.adjust(timer.id, Attotime::from_usec(3));
            }
            Ok(())
        }
    }

    #[test]
    fn run_until_fires_each_due_timer_once_in_order() {
        let mut m = StepMachine::new(Attotime::from_usec(1));
        let a = m.sched.timer_alloc("a");
        let b = m.sched.timer_alloc("b");
        let c = m.sched.timer_alloc("c");
        let late = m.sched.timer_alloc("late");
        m.sched.adjust(b, Attotime::from_usec(4));
        m.sched.adjust(a, Attotime::from_usec(4));
        m.sched.adjust(c, Attotime::from_usec(2));
        m.sched.adjust(late, Attotime::from_usec(11));
        m.rearm = Some(c);

        m.run_until(Attotime::from_usec(10)).unwrap();

        let got: Vec<_> = m.fired.iter().map(|(id, t)| (*id, *t)).collect();
        assert_eq!(
            got,
            [
                (c, Attotime::from_usec(2)),
                (b, Attotime::from_usec(4)),
                (a, Attotime::from_usec(4)),
                (c, Attotime::from_usec(5)),
                (c, Attotime::from_usec(8)),
            ]
        );
        assert_eq!(m.sched.now(), Attotime::from_usec(10));
        assert!(m.sched.enabled(late));
    }

    #[test]
    fn deadline_equal_to_target_fires() {
        let mut m = StepMachine::new(Attotime::from_usec(1));
        let t = m.sched.timer_alloc("t");
        m.sched.adjust(t, Attotime::from_usec(6));
        m.run_until(Attotime::from_usec(6)).unwrap();
        assert_eq!(m.fired, [(t, Attotime::from_usec(6))]);
    }

    #[test]
    fn stalled_device_is_an_error() {
        let mut m = StepMachine::new(Attotime::from_usec(1));
        m.stalled = true;
        let err = m.run_until(Attotime::from_usec(3)).unwrap_err();
        assert!(matches!(err, EmuError::NoProgress { .. }));
    }
}
