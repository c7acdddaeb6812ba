//! Randomized ordering checks against a plain sorted model.
//!
//! Run with: cargo test --package phasecall_core --test ordering_properties

use std::cell::RefCell;
use std::rc::Rc;

use phasecall_core::{HookPoint, HookTable, Phase, Receiver, Scheduler, SchedulerConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

type Log = Rc<RefCell<Vec<usize>>>;

fn scheduler() -> (Scheduler, Rc<HookTable>) {
    let hooks = Rc::new(HookTable::new());
    (Scheduler::new(SchedulerConfig::default(), hooks.clone()).unwrap(), hooks)
}

fn tagged(log: &Log, tag: usize) -> Receiver {
    let log = Rc::clone(log);
    Receiver::new(move || log.borrow_mut().push(tag))
}

/// Expected pass order: ascending priority, and inside a bucket the most
/// recent registration first.
fn model_order(registrations: &[(i32, usize)]) -> Vec<usize> {
    let mut indexed: Vec<(i32, usize, usize)> = registrations
        .iter()
        .enumerate()
        .map(|(seq, &(priority, tag))| (priority, seq, tag))
        .collect();
    indexed.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    indexed.into_iter().map(|(_, _, tag)| tag).collect()
}

#[test]
fn test_random_registrations_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    for _round in 0..50 {
        let (scheduler, hooks) = scheduler();
        let log = Log::default();
        let mut post = Vec::new();
        let mut pre = Vec::new();
        let mut keep = Vec::new();

        for tag in 0..rng.gen_range(1..60) {
            let priority = rng.gen_range(-20..20);
            let receiver = tagged(&log, tag);
            scheduler.add_fixed_update_receiver(&receiver, priority);
            if priority < 0 {
                pre.push((priority, tag));
            } else {
                post.push((priority, tag));
            }
            keep.push(receiver);
        }

        hooks.fire(HookPoint::pre(Phase::FixedUpdate));
        assert_eq!(*log.borrow(), model_order(&pre));

        log.borrow_mut().clear();
        hooks.fire(HookPoint::post(Phase::FixedUpdate));
        assert_eq!(*log.borrow(), model_order(&post));

        let priorities = scheduler.priorities(HookPoint::post(Phase::FixedUpdate));
        assert!(
            priorities.windows(2).all(|pair| pair[0] < pair[1]),
            "buckets strictly ascending"
        );
    }
}

#[test]
fn test_random_removals_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (scheduler, hooks) = scheduler();
    let log = Log::default();

    let receivers: Vec<Receiver> = (0..40).map(|tag| tagged(&log, tag)).collect();
    let mut live: Vec<(i32, usize)> = Vec::new();

    for _step in 0..2_000 {
        let tag = rng.gen_range(0..receivers.len());
        let priority = rng.gen_range(0..8);
        if rng.gen_bool(0.55) {
            scheduler.add_late_update_receiver(&receivers[tag], priority);
            live.push((priority, tag));
        } else {
            let removed = scheduler.remove_late_update_receiver(&receivers[tag], priority);
            let position = live.iter().position(|&entry| entry == (priority, tag));
            assert_eq!(removed, position.is_some());
            if let Some(position) = position {
                live.remove(position);
            }
        }
    }

    log.borrow_mut().clear();
    hooks.fire(HookPoint::post(Phase::LateUpdate));
    assert_eq!(*log.borrow(), model_order(&live));
    assert_eq!(
        scheduler.receiver_count(HookPoint::post(Phase::LateUpdate)),
        live.len()
    );
    assert_eq!(
        hooks.is_set(HookPoint::post(Phase::LateUpdate)),
        !live.is_empty()
    );
}

#[test]
fn test_churn_allocates_at_most_pool_capacity() {
    let hooks = Rc::new(HookTable::new());
    let config = SchedulerConfig {
        pool_capacity: 4,
        ..SchedulerConfig::default()
    };
    let scheduler = Scheduler::new(config, hooks).unwrap();
    let receivers: Vec<Receiver> = (0..4).map(|_| Receiver::new(|| {})).collect();

    for cycle in 0..10_000 {
        for (i, receiver) in receivers.iter().enumerate() {
            let priority = cycle * 4 + i32::try_from(i).unwrap();
            scheduler.add_update_receiver(receiver, priority);
        }
        for (i, receiver) in receivers.iter().enumerate() {
            let priority = cycle * 4 + i32::try_from(i).unwrap();
            assert!(scheduler.remove_update_receiver(receiver, priority));
        }
    }

    assert!(scheduler.pool_stats().allocated <= 4);
    assert_eq!(scheduler.pool_stats().discarded, 0);
}
