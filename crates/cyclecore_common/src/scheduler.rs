//! Timer queue and simulated time base.
//!
//! All timers live in one `Scheduler`. Devices allocate them once when they
//! start and keep the returned `TimerId`; the owning machine routes each
//! expiry back to the device through `Machine::timer_expired`.

use crate::state::{Saveable, StateVisitor};
use crate::time::Attotime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(usize);

impl TimerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A timer that reached its deadline, as handed to the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub param: u64,
    pub expire: Attotime,
}

#[derive(Clone, Debug)]
struct Timer {
    name: String,
    enabled: bool,
    expire: Attotime,
    period: Attotime,
    param: u64,
    /// Arm order; breaks ties between equal deadlines.
    seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now: Attotime,
    /// Local time of the device executing the current timeslice.
    local: Option<Attotime>,
    timers: Vec<Timer>,
    next_seq: u64,
    slice_end: Attotime,
    aborted: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time: the executing device's local time inside a timeslice,
    /// otherwise the scheduler base time.
    #[inline]
    pub fn now(&self) -> Attotime {
        self.local.unwrap_or(self.now)
    }

    pub fn timer_alloc(&mut self, name: impl Into<String>) -> TimerId {
        let id = TimerId(self.timers.len());
        self.timers.push(Timer {
            name: name.into(),
            enabled: false,
            expire: Attotime::NEVER,
            period: Attotime::NEVER,
            param: 0,
            seq: 0,
        });
        id
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn name(&self, id: TimerId) -> &str {
        &self.timers[id.0].name
    }

    /// One-shot arm `delay` from now. `Attotime::NEVER` disables the timer.
    pub fn adjust(&mut self, id: TimerId, delay: Attotime) {
        self.adjust_periodic(id, delay, Attotime::NEVER);
    }

    /// Arm `delay` from now, then every `period` after that. A zero period
    /// is treated as one-shot.
    pub fn adjust_periodic(&mut self, id: TimerId, delay: Attotime, period: Attotime) {
        let now = self.now();
        let seq = self.bump_seq();
        let timer = &mut self.timers[id.0];
        timer.period = if period.is_zero() {
            Attotime::NEVER
        } else {
            period
        };
        if delay.is_never() {
            timer.enabled = false;
            timer.expire = Attotime::NEVER;
            return;
        }
        timer.enabled = true;
        timer.expire = now + delay;
        timer.seq = seq;
        log::trace!(
            "timer '{}' armed for {} (period {})",
            timer.name,
            timer.expire,
            timer.period
        );
        if self.local.is_some() && timer.expire < self.slice_end {
            self.aborted = true;
        }
    }

    pub fn set_param(&mut self, id: TimerId, param: u64) {
        self.timers[id.0].param = param;
    }

    pub fn param(&self, id: TimerId) -> u64 {
        self.timers[id.0].param
    }

    pub fn reset(&mut self, id: TimerId) {
        self.adjust(id, Attotime::NEVER);
    }

    pub fn enabled(&self, id: TimerId) -> bool {
        self.timers[id.0].enabled
    }

    pub fn expire_time(&self, id: TimerId) -> Attotime {
        let timer = &self.timers[id.0];
        if timer.enabled {
            timer.expire
        } else {
            Attotime::NEVER
        }
    }

    pub fn remaining(&self, id: TimerId) -> Attotime {
        let expire = self.expire_time(id);
        if expire.is_never() {
            Attotime::NEVER
        } else {
            expire - self.now()
        }
    }

    /// Earliest enabled deadline, or `NEVER`.
    pub fn next_expiry(&self) -> Attotime {
        self.timers
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.expire)
            .min()
            .unwrap_or(Attotime::NEVER)
    }

    /// Pop the earliest timer due at or before `upto` and move time to its
    /// deadline. Periodic timers are re-armed before being returned.
    pub fn fire_next(&mut self, upto: Attotime) -> Option<FiredTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled && t.expire <= upto)
            .min_by_key(|(_, t)| (t.expire, t.seq))
            .map(|(i, _)| i)?;

        let expire = self.timers[index].expire;
        if expire > self.now {
            self.now = expire;
        }

        let seq = self.bump_seq();
        let timer = &mut self.timers[index];
        if timer.period.is_never() {
            timer.enabled = false;
            timer.expire = Attotime::NEVER;
        } else {
            timer.expire = expire + timer.period;
            timer.seq = seq;
        }
        log::trace!("timer '{}' fired at {}", timer.name, expire);

        Some(FiredTimer {
            id: TimerId(index),
            param: timer.param,
            expire,
        })
    }

    /// Open a timeslice that is expected to run up to `end`.
    pub fn begin_timeslice(&mut self, end: Attotime) {
        self.slice_end = end;
        self.local = Some(self.now);
        self.aborted = false;
    }

    /// Publish the executing device's local time. Timers armed from here on
    /// are relative to it.
    pub fn set_local_time(&mut self, time: Attotime) {
        if self.local.is_some() {
            self.local = Some(time);
        }
    }

    /// True once a timer was armed inside the current slice with a deadline
    /// before the slice end.
    pub fn timeslice_aborted(&self) -> bool {
        self.aborted
    }

    /// Close the current timeslice and report whether it was aborted.
    pub fn end_timeslice(&mut self) -> bool {
        self.local = None;
        self.slice_end = Attotime::NEVER;
        std::mem::take(&mut self.aborted)
    }

    pub fn advance_to(&mut self, time: Attotime) {
        if time > self.now {
            self.now = time;
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Saveable for Scheduler {
    fn save_state(&mut self, state: &mut dyn StateVisitor) {
        state.time("scheduler.now", &mut self.now);
        state.u64("scheduler.next_seq", &mut self.next_seq);
        for (index, timer) in self.timers.iter_mut().enumerate() {
            state.bool(&format!("timer[{index}].enabled"), &mut timer.enabled);
            state.time(&format!("timer[{index}].expire"), &mut timer.expire);
            state.time(&format!("timer[{index}].period"), &mut timer.period);
            state.u64(&format!("timer[{index}].param"), &mut timer.param);
            state.u64(&format!("timer[{index}].seq"), &mut timer.seq);
        }
    }
}

#[cfg(test)]
mod tests;
