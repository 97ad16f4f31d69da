use std::fmt;
use std::ops::{Add, AddAssign, Sub};

pub const ATTOSECONDS_PER_SECOND: u128 = 1_000_000_000_000_000_000;

/// Attoseconds taken by one cycle of a `clock` Hz device.
///
/// Integer division, so cycle/time conversions for a given clock always
/// round-trip exactly.
#[inline]
pub const fn attoseconds_per_cycle(clock: u32) -> u128 {
    ATTOSECONDS_PER_SECOND / clock as u128
}

/// Simulated time in attoseconds (10^-18 s).
///
/// Used both as an absolute machine time and as a delay. `NEVER` is the
/// disabled/infinite value and absorbs arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attotime(u128);

impl Attotime {
    pub const ZERO: Attotime = Attotime(0);
    pub const NEVER: Attotime = Attotime(u128::MAX);

    #[inline]
    pub const fn from_attoseconds(attoseconds: u128) -> Self {
        Attotime(attoseconds)
    }

    #[inline]
    pub const fn as_attoseconds(self) -> u128 {
        self.0
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Attotime(seconds as u128 * ATTOSECONDS_PER_SECOND)
    }

    pub const fn from_msec(msec: u64) -> Self {
        Attotime(msec as u128 * (ATTOSECONDS_PER_SECOND / 1_000))
    }

    pub const fn from_usec(usec: u64) -> Self {
        Attotime(usec as u128 * (ATTOSECONDS_PER_SECOND / 1_000_000))
    }

    pub const fn from_nsec(nsec: u64) -> Self {
        Attotime(nsec as u128 * (ATTOSECONDS_PER_SECOND / 1_000_000_000))
    }

    /// One period of a `hz` signal. A zero frequency never fires.
    pub const fn from_hz(hz: u32) -> Self {
        if hz == 0 {
            Attotime::NEVER
        } else {
            Attotime(ATTOSECONDS_PER_SECOND / hz as u128)
        }
    }

    pub const fn from_cycles(cycles: u64, clock: u32) -> Self {
        if clock == 0 {
            Attotime::NEVER
        } else {
            Attotime(cycles as u128 * attoseconds_per_cycle(clock))
        }
    }

    /// Whole cycles of a `clock` Hz device elapsed in `self` (floor).
    pub fn as_cycles(self, clock: u32) -> u64 {
        if self.is_never() || clock == 0 {
            return u64::MAX;
        }
        u64::try_from(self.0 / attoseconds_per_cycle(clock)).unwrap_or(u64::MAX)
    }

    /// Cycles needed to get from `self` to `target`, rounded up and never
    /// less than one.
    pub fn cycles_until(self, target: Attotime, clock: u32) -> u64 {
        if target.is_never() || clock == 0 {
            return u64::MAX;
        }
        let delta = target.0.saturating_sub(self.0);
        let per_cycle = attoseconds_per_cycle(clock);
        let cycles = delta.div_ceil(per_cycle).max(1);
        u64::try_from(cycles).unwrap_or(u64::MAX)
    }

    #[inline]
    pub const fn is_never(self) -> bool {
        self.0 == u128::MAX
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn seconds(self) -> u128 {
        self.0 / ATTOSECONDS_PER_SECOND
    }

    pub const fn subseconds(self) -> u128 {
        self.0 % ATTOSECONDS_PER_SECOND
    }
}

impl Add for Attotime {
    type Output = Attotime;

    fn add(self, rhs: Attotime) -> Attotime {
        if self.is_never() || rhs.is_never() {
            return Attotime::NEVER;
        }
        Attotime(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Attotime {
    fn add_assign(&mut self, rhs: Attotime) {
        *self = *self + rhs;
    }
}

impl Sub for Attotime {
    type Output = Attotime;

    fn sub(self, rhs: Attotime) -> Attotime {
        if self.is_never() {
            return Attotime::NEVER;
        }
        Attotime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Attotime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "never")
        } else {
            write!(f, "{}.{:018}", self.seconds(), self.subseconds())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_round_trip_for_non_dividing_clock() {
        let clock = 12_000_000;
        let t = Attotime::from_cycles(1234, clock);
        assert_eq!(t.as_cycles(clock), 1234);
        assert_eq!(Attotime::ZERO.cycles_until(t, clock), 1234);
    }

    #[test]
    fn cycles_until_rounds_up_and_is_at_least_one() {
        let clock = 1_000_000;
        let now = Attotime::from_usec(10);
        assert_eq!(now.cycles_until(now, clock), 1);
        let target = now + Attotime::from_nsec(1500);
        assert_eq!(now.cycles_until(target, clock), 2);
    }

    #[test]
    fn never_absorbs_arithmetic() {
        assert!((Attotime::NEVER + Attotime::from_seconds(1)).is_never());
        assert!((Attotime::NEVER - Attotime::from_seconds(1)).is_never());
        assert!(Attotime::from_hz(0).is_never());
        assert_eq!(Attotime::from_msec(1) - Attotime::from_msec(2), Attotime::ZERO);
    }

    #[test]
    fn display_uses_fixed_fraction() {
        assert_eq!(
            Attotime::from_msec(1500).to_string(),
            "1.500000000000000000"
        );
        assert_eq!(Attotime::NEVER.to_string(), "never");
    }
}
