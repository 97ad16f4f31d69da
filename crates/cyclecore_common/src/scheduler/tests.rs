use super::*;

fn drain(sched: &mut Scheduler, upto: Attotime) -> Vec<(usize, Attotime)> {
    let mut fired = Vec::new();
    while let Some(timer) = sched.fire_next(upto) {
        fired.push((timer.id.index(), timer.expire));
    }
    fired
}

#[test]
fn equal_deadlines_fire_in_arm_order() {
    let mut sched = Scheduler::new();
    let a = sched.timer_alloc("a");
    let b = sched.timer_alloc("b");
    let c = sched.timer_alloc("c");

    let t = Attotime::from_usec(5);
    sched.adjust(c, t);
    sched.adjust(a, t);
    sched.adjust(b, t);

    let order: Vec<_> = drain(&mut sched, t).into_iter().map(|(i, _)| i).collect();
    assert_eq!(order, [c.index(), a.index(), b.index()]);
    assert_eq!(sched.now(), t);
}

#[test]
fn rearming_moves_a_timer_behind_its_peers() {
    let mut sched = Scheduler::new();
    let a = sched.timer_alloc("a");
    let b = sched.timer_alloc("b");
    let t = Attotime::from_usec(1);
    sched.adjust(a, t);
    sched.adjust(b, t);
    sched.adjust(a, t);

    let order: Vec<_> = drain(&mut sched, t).into_iter().map(|(i, _)| i).collect();
    assert_eq!(order, [b.index(), a.index()]);
}

#[test]
fn periodic_timer_fires_once_per_period() {
    let mut sched = Scheduler::new();
    let tick = sched.timer_alloc("tick");
    let period = Attotime::from_usec(10);
    sched.adjust_periodic(tick, period, period);

    let fired = drain(&mut sched, Attotime::from_usec(35));
    let times: Vec<_> = fired.iter().map(|(_, t)| *t).collect();
    assert_eq!(
        times,
        [
            Attotime::from_usec(10),
            Attotime::from_usec(20),
            Attotime::from_usec(30)
        ]
    );
    assert_eq!(sched.expire_time(tick), Attotime::from_usec(40));
}

#[test]
fn param_rides_along_with_every_periodic_firing() {
    let mut sched = Scheduler::new();
    let tick = sched.timer_alloc("tick");
    let period = Attotime::from_usec(10);
    sched.set_param(tick, 7);
    sched.adjust_periodic(tick, period, period);
    sched.adjust_periodic(tick, period, period);
    assert_eq!(sched.param(tick), 7);

    let mut params = Vec::new();
    while let Some(timer) = sched.fire_next(Attotime::from_usec(25)) {
        params.push(timer.param);
    }
    assert_eq!(params, [7, 7]);
}

#[test]
fn never_delay_disables() {
    let mut sched = Scheduler::new();
    let t = sched.timer_alloc("t");
    sched.adjust(t, Attotime::from_usec(3));
    assert!(sched.enabled(t));
    assert_eq!(sched.remaining(t), Attotime::from_usec(3));

    sched.adjust(t, Attotime::NEVER);
    assert!(!sched.enabled(t));
    assert!(sched.remaining(t).is_never());
    assert!(sched.next_expiry().is_never());
    assert!(sched.fire_next(Attotime::from_seconds(1)).is_none());
}

#[test]
fn arming_before_slice_end_aborts_the_slice() {
    let mut sched = Scheduler::new();
    let late = sched.timer_alloc("late");
    let early = sched.timer_alloc("early");

    sched.begin_timeslice(Attotime::from_usec(100));
    sched.set_local_time(Attotime::from_usec(20));
    sched.adjust(late, Attotime::from_usec(200));
    assert!(!sched.timeslice_aborted());

    sched.adjust(early, Attotime::from_usec(5));
    assert!(sched.timeslice_aborted());
    assert_eq!(sched.expire_time(early), Attotime::from_usec(25));

    assert!(sched.end_timeslice());
    assert_eq!(sched.now(), Attotime::ZERO);
}

#[test]
fn timers_survive_a_state_round_trip() {
    use crate::state::{StateReader, StateWriter};

    let mut sched = Scheduler::new();
    let a = sched.timer_alloc("a");
    let b = sched.timer_alloc("b");
    sched.adjust_periodic(a, Attotime::from_usec(7), Attotime::from_usec(7));
    sched.adjust(b, Attotime::from_usec(7));
    sched.set_param(b, 99);
    let blob = StateWriter::save(&mut sched);

    let mut restored = Scheduler::new();
    restored.timer_alloc("a");
    restored.timer_alloc("b");
    StateReader::load(&mut restored, &blob).unwrap();

    let fired = restored.fire_next(Attotime::from_usec(7)).unwrap();
    assert_eq!(fired.id, a);
    let fired = restored.fire_next(Attotime::from_usec(7)).unwrap();
    assert_eq!(fired.id, b);
    assert_eq!(fired.param, 99);
}
