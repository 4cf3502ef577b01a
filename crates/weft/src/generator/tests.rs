use core::{cell::Cell, time::Duration};
use std::{
    collections::HashSet,
    rc::Rc,
    sync::{Arc, Mutex},
    thread::scope,
};

use crate::{
    Error, GeneratorConfig, IdGenStatus, SequentialId, SequentialIdGenerator, TimeSource,
    generate_next_id,
};

const NO_EPOCH: Duration = Duration::ZERO;

struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test moves by hand.
#[derive(Default)]
struct ManualClock {
    millis: Cell<u64>,
}

impl ManualClock {
    fn at(millis: u64) -> Rc<Self> {
        let clock = Self::default();
        clock.millis.set(millis);
        Rc::new(clock)
    }

    fn set(&self, millis: u64) {
        self.millis.set(millis);
    }

    fn advance(&self, by: u64) {
        self.millis.set(self.millis.get() + by);
    }
}

impl TimeSource for Rc<ManualClock> {
    fn current_millis(&self) -> u64 {
        self.millis.get()
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> SequentialId;
    fn unwrap_pending(self) -> u64;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> SequentialId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn config(worker_id: u64, datacenter_id: u64) -> GeneratorConfig {
    GeneratorConfig::new(worker_id, datacenter_id).with_epoch(NO_EPOCH)
}

#[test]
fn sequence_increments_within_same_tick() {
    let generator =
        SequentialIdGenerator::with_time(config(3, 4), MockTime { millis: 42 }).unwrap();

    let id1 = generator.try_poll_id().unwrap().unwrap_ready();
    let id2 = generator.try_poll_id().unwrap().unwrap_ready();
    let id3 = generator.try_poll_id().unwrap().unwrap_ready();

    for id in [id1, id2, id3] {
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.worker_id(), 3);
        assert_eq!(id.datacenter_id(), 4);
    }
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn sequence_resets_on_new_millisecond() {
    let clock = ManualClock::at(10);
    let generator = SequentialIdGenerator::with_time(config(0, 0), clock.clone()).unwrap();

    generator.next_sequential_id().unwrap();
    let second = generator.next_sequential_id().unwrap();
    assert_eq!(second.sequence(), 1);

    clock.advance(1);
    let third = generator.next_sequential_id().unwrap();
    assert_eq!(third.timestamp(), 11);
    assert_eq!(third.sequence(), 0);
    assert!(third > second);
}

#[test]
fn poll_returns_pending_when_sequence_exhausted() {
    let generator = SequentialIdGenerator::from_components(
        config(0, 0),
        0,
        SequentialId::max_sequence(),
        MockTime { millis: 0 },
    )
    .unwrap();
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 1);
}

#[test]
fn rollover_waits_exactly_once_and_never_duplicates() {
    let clock = ManualClock::at(42);
    let generator = SequentialIdGenerator::with_time(config(1, 1), clock.clone()).unwrap();

    let mut waits = 0;
    let mut seen = HashSet::new();
    for _ in 0..4097 {
        let id = generator
            .next_sequential_id_with(|yield_for| {
                assert_eq!(yield_for, 1);
                waits += 1;
                clock.advance(yield_for);
            })
            .unwrap();
        assert!(seen.insert(id), "duplicate id {id:?}");
    }

    assert_eq!(waits, 1);
    assert_eq!(seen.len(), 4097);
    let last = seen.iter().max().copied().unwrap();
    assert_eq!(last.timestamp(), 43);
    assert_eq!(last.sequence(), 0);
}

#[test]
fn wait_strategy_is_polled_until_clock_advances() {
    let clock = ManualClock::at(7);
    let generator = SequentialIdGenerator::from_components(
        config(0, 0),
        7,
        SequentialId::max_sequence(),
        clock.clone(),
    )
    .unwrap();

    // The clock only moves on the third wait.
    let mut waits = 0;
    let id = generator
        .next_sequential_id_with(|_| {
            waits += 1;
            if waits == 3 {
                clock.advance(1);
            }
        })
        .unwrap();

    assert_eq!(waits, 3);
    assert_eq!(id.timestamp(), 8);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn clock_regression_is_rejected() {
    let clock = ManualClock::at(100);
    let generator = SequentialIdGenerator::with_time(config(0, 0), clock.clone()).unwrap();
    let first = generator.next_sequential_id().unwrap();

    clock.set(99);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards {
            last_millis: 100,
            now_millis: 99,
        })
    );
    assert!(matches!(
        generator.try_poll_id(),
        Err(Error::ClockMovedBackwards { .. })
    ));

    // State was not rewound: the next id continues the old timestamp.
    clock.set(100);
    let next = generator.next_sequential_id().unwrap();
    assert_eq!(next.timestamp(), 100);
    assert_eq!(next.sequence(), first.sequence() + 1);
}

#[test]
fn clock_regression_reports_absolute_millis() {
    let epoch = Duration::from_millis(1_000);
    let clock = ManualClock::at(1_500);
    let generator =
        SequentialIdGenerator::with_time(config(0, 0).with_epoch(epoch), clock.clone()).unwrap();
    generator.next_id().unwrap();

    clock.set(1_200);
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockMovedBackwards {
            last_millis: 1_500,
            now_millis: 1_200,
        })
    );
}

#[test]
fn clock_before_epoch_is_rejected() {
    let epoch = Duration::from_millis(5_000);
    let generator = SequentialIdGenerator::with_time(
        config(0, 0).with_epoch(epoch),
        MockTime { millis: 4_999 },
    )
    .unwrap();
    assert_eq!(
        generator.next_id(),
        Err(Error::ClockBeforeEpoch {
            now_millis: 4_999,
            epoch_millis: 5_000,
        })
    );
}

#[test]
fn timestamp_is_relative_to_epoch() {
    let epoch = Duration::from_millis(1_288_834_974_657);
    let now = epoch.as_millis() as u64 + 5_000;
    let generator =
        SequentialIdGenerator::with_time(config(2, 9).with_epoch(epoch), MockTime { millis: now })
            .unwrap();

    assert_eq!(generator.worker_id(), 2);
    assert_eq!(generator.datacenter_id(), 9);
    assert_eq!(generator.epoch(), epoch);
    assert_eq!(*generator.config(), config(2, 9).with_epoch(epoch));

    let raw = generator.next_id().unwrap();
    let id = SequentialId::try_from(raw).unwrap();
    assert_eq!(id.timestamp(), 5_000);
    assert_eq!(id.unix_millis(epoch), now);
    assert_eq!(raw, (5_000 << 22) | (9 << 17) | (2 << 12));
}

#[test]
fn out_of_range_coordinates_fail_construction() {
    assert_eq!(
        SequentialIdGenerator::new(32, 0).unwrap_err(),
        Error::WorkerIdOutOfRange { value: 32, max: 31 }
    );
    assert_eq!(
        SequentialIdGenerator::new(0, 32).unwrap_err(),
        Error::DatacenterIdOutOfRange { value: 32, max: 31 }
    );
    assert!(SequentialIdGenerator::new(31, 31).is_ok());
}

#[test]
fn restored_state_must_fit_its_fields() {
    assert_eq!(
        SequentialIdGenerator::from_components(config(0, 0), 7, 4096, MockTime { millis: 7 })
            .unwrap_err(),
        Error::SequenceOutOfRange {
            value: 4096,
            max: 4095,
        }
    );
    assert_eq!(
        SequentialIdGenerator::from_components(
            config(0, 0),
            1 << 41,
            0,
            MockTime { millis: 7 }
        )
        .unwrap_err(),
        Error::TimestampOutOfRange {
            value: 1 << 41,
            max: (1 << 41) - 1,
        }
    );

    // The largest values are accepted and not wrapped.
    let generator = SequentialIdGenerator::from_components(
        config(0, 0),
        100,
        SequentialId::max_sequence(),
        MockTime { millis: 100 },
    )
    .unwrap();
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 1);
}

#[test]
fn layout_round_trips_for_every_coordinate() {
    for datacenter_id in 0..32 {
        for worker_id in 0..32 {
            let generator = SequentialIdGenerator::with_time(
                config(worker_id, datacenter_id),
                MockTime { millis: 77 },
            )
            .unwrap();
            let id = SequentialId::try_from(generator.next_id().unwrap()).unwrap();
            assert_eq!(id.timestamp(), 77);
            assert_eq!(id.datacenter_id(), datacenter_id);
            assert_eq!(id.worker_id(), worker_id);
            assert_eq!(id.sequence(), 0);
        }
    }
}

#[test]
fn one_million_ids_are_strictly_increasing() {
    const TOTAL_IDS: usize = 1_000_000;
    let generator = SequentialIdGenerator::new(1, 1).unwrap();

    let mut last = generator.next_id().unwrap();
    for _ in 1..TOTAL_IDS {
        let id = generator.next_id().unwrap();
        assert!(id > last, "{id} not greater than {last}");
        last = id;
    }
}

#[test]
fn distinct_coordinates_never_overlap() {
    const IDS_PER_GENERATOR: usize = 10_000;
    let a = SequentialIdGenerator::new(0, 0).unwrap();
    let b = SequentialIdGenerator::new(1, 0).unwrap();

    let mut seen = HashSet::with_capacity(IDS_PER_GENERATOR * 2);
    for _ in 0..IDS_PER_GENERATOR {
        assert!(seen.insert(a.next_id().unwrap()));
        assert!(seen.insert(b.next_id().unwrap()));
    }
    assert_eq!(seen.len(), IDS_PER_GENERATOR * 2);
}

#[test]
fn shared_generator_is_unique_across_threads() {
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 4096 * 64;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let generator = Arc::new(SequentialIdGenerator::new(5, 6).unwrap());
    let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(TOTAL_IDS)));

    scope(|s| {
        for _ in 0..THREADS {
            let generator = Arc::clone(&generator);
            let seen_ids = Arc::clone(&seen_ids);
            s.spawn(move || {
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                let mut last = i64::MIN;
                for _ in 0..IDS_PER_THREAD {
                    let id = generator.next_id().unwrap();
                    // Each thread observes its own ids in increasing order.
                    assert!(id > last);
                    last = id;
                    local.push(id);
                }
                let mut seen = seen_ids.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id));
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, TOTAL_IDS, "Expected {TOTAL_IDS} unique IDs");
}

#[test]
fn process_wide_generator_is_increasing() {
    let a = generate_next_id().unwrap();
    let b = generate_next_id().unwrap();
    assert!(b > a);

    let id = SequentialId::try_from(b).unwrap();
    assert_eq!(id.worker_id(), 0);
    assert_eq!(id.datacenter_id(), 0);
}
