use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::thread::scope;
use std::time::Duration;

use crate::{
    CarryForward, CounterAllocator, CounterStore, Error, MemoryCounterStore, PartitionKey, Result,
    RetryPolicy, SequenceAllocator, Serial, StoreError, YEAR_SLASH_FORMAT,
};

fn key(name: &str) -> PartitionKey {
    PartitionKey::new(name).unwrap()
}

/// Fails the first `failures` updates with a configurable error, then
/// delegates to an in-memory store.
struct FlakyStore {
    inner: MemoryCounterStore,
    failures: AtomicU32,
    error: fn() -> StoreError,
}

impl FlakyStore {
    fn conflicting(failures: u32) -> Self {
        Self {
            inner: MemoryCounterStore::new(),
            failures: AtomicU32::new(failures),
            error: || StoreError::Conflict,
        }
    }

    fn corrupt(failures: u32) -> Self {
        Self {
            inner: MemoryCounterStore::new(),
            failures: AtomicU32::new(failures),
            error: || StoreError::Corrupt(String::from("bad row")),
        }
    }
}

impl CounterStore for FlakyStore {
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        if self.failures.load(Ordering::Relaxed) > 0 {
            self.failures.fetch_sub(1, Ordering::Relaxed);
            return Err((self.error)());
        }
        self.inner.update(key, apply)
    }

    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        self.inner.peek(key)
    }
}

/// Parks updates on one designated partition until released, leaving every
/// other partition untouched.
struct BlockingStore {
    inner: MemoryCounterStore,
    gated: PartitionKey,
    release: Mutex<Receiver<()>>,
}

impl CounterStore for BlockingStore {
    fn update<R>(
        &self,
        key: &PartitionKey,
        apply: impl FnOnce(Option<u64>) -> (u64, R),
    ) -> Result<R, StoreError> {
        if *key == self.gated {
            self.release
                .lock()
                .map_err(|_| StoreError::Unavailable(String::from("gate poisoned")))?
                .recv()
                .map_err(|_| StoreError::Unavailable(String::from("gate dropped")))?;
        }
        self.inner.update(key, apply)
    }

    fn peek(&self, key: &PartitionKey) -> Result<Option<u64>, StoreError> {
        self.inner.peek(key)
    }
}

fn run_first_allocation_is_one<A: SequenceAllocator>(allocator: &A, key: &PartitionKey) {
    assert_eq!(allocator.try_last_issued(key).unwrap(), None);
    assert_eq!(allocator.try_allocate(key).unwrap(), Serial::new(1));
}

fn run_sequential_allocations_are_dense<A: SequenceAllocator>(allocator: &A, key: &PartitionKey) {
    for expected in 1..=5u64 {
        assert_eq!(allocator.try_allocate(key).unwrap().get(), expected);
    }
    assert_eq!(allocator.try_last_issued(key).unwrap(), Some(Serial::new(5)));
}

fn run_partitions_are_independent<A: SequenceAllocator>(allocator: &A) {
    let year = key("2025");
    let section_year = PartitionKey::composite(["RTI", "2025"]).unwrap();

    // Interleaved from one thread, each partition still counts 1, 2, 3.
    for expected in 1..=3u64 {
        assert_eq!(allocator.try_allocate(&year).unwrap().get(), expected);
        assert_eq!(allocator.try_allocate(&section_year).unwrap().get(), expected);
    }
    assert_eq!(allocator.try_last_issued(&year).unwrap(), Some(Serial::new(3)));
    assert_eq!(
        allocator.try_last_issued(&section_year).unwrap(),
        Some(Serial::new(3))
    );
}

fn run_threaded_allocations_unique_and_dense<A>(allocator: &A, key: &PartitionKey)
where
    A: SequenceAllocator + Sync,
{
    const THREADS: usize = 8;
    const PER_THREAD: usize = 32;

    let issued = Mutex::new(Vec::with_capacity(THREADS * PER_THREAD));
    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    let serial = allocator.try_allocate(key).unwrap();
                    issued.lock().unwrap().push(serial.get());
                }
            });
        }
    });

    let mut issued = issued.into_inner().unwrap();
    let distinct: HashSet<u64> = issued.iter().copied().collect();
    assert_eq!(distinct.len(), THREADS * PER_THREAD);

    issued.sort_unstable();
    let expected: Vec<u64> = (1..=(THREADS * PER_THREAD) as u64).collect();
    assert_eq!(issued, expected);
}

#[test]
fn first_allocation_returns_one() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    run_first_allocation_is_one(&allocator, &key("2025"));
}

#[test]
fn sequential_allocations_are_dense() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    run_sequential_allocations_are_dense(&allocator, &key("2025"));
}

#[test]
fn partitions_do_not_cross_contaminate() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    run_partitions_are_independent(&allocator);
}

#[test]
fn threaded_allocations_are_unique_and_dense() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    run_threaded_allocations_unique_and_dense(&allocator, &key("2025"));
}

#[test]
fn serials_format_into_identifiers() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    let year = key("2025");

    let rendered: Vec<String> = (0..3)
        .map(|_| {
            let serial = allocator.try_allocate(&year).unwrap();
            YEAR_SLASH_FORMAT.render(&["2025"], serial)
        })
        .collect();
    assert_eq!(rendered, ["2025/0001", "2025/0002", "2025/0003"]);
}

#[test]
fn seeded_partition_continues_from_carry_forward() {
    let store = MemoryCounterStore::new();
    store.update(&key("2024"), |_| (42, ())).unwrap();

    let allocator = CounterAllocator::with_seed(
        &store,
        CarryForward::new(|_key: &PartitionKey| PartitionKey::new("2024").ok()),
    );
    assert_eq!(allocator.try_allocate(&key("2025")).unwrap().get(), 43);
    assert_eq!(allocator.try_allocate(&key("2025")).unwrap().get(), 44);
    // The seeded partition is dense from seed + 1 and the seed partition is
    // untouched.
    assert_eq!(store.peek(&key("2024")).unwrap(), Some(42));
}

#[test]
fn transient_conflicts_are_retried() {
    let allocator = CounterAllocator::new(FlakyStore::conflicting(2))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    assert_eq!(allocator.try_allocate(&key("2025")).unwrap().get(), 1);
}

#[test]
fn exhausted_retries_surface_storage_unavailable() {
    let allocator = CounterAllocator::new(FlakyStore::conflicting(10))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    let err = allocator.try_allocate(&key("2025")).unwrap_err();
    assert_eq!(
        err,
        Error::StorageUnavailable {
            attempts: 3,
            source: StoreError::Conflict,
        }
    );
}

#[test]
fn corrupt_rows_are_not_retried() {
    let allocator = CounterAllocator::new(FlakyStore::corrupt(1))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    let err = allocator.try_allocate(&key("2025")).unwrap_err();
    assert!(matches!(
        err,
        Error::StorageUnavailable {
            attempts: 1,
            source: StoreError::Corrupt(_),
        }
    ));
}

#[test]
fn failed_allocation_issues_nothing() {
    let store = FlakyStore::conflicting(10);
    let allocator =
        CounterAllocator::new(&store).with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
    allocator.try_allocate(&key("2025")).unwrap_err();

    // The next successful allocation is still the partition's first serial.
    store.failures.store(0, Ordering::Relaxed);
    assert_eq!(allocator.try_allocate(&key("2025")).unwrap().get(), 1);
}

#[test]
fn blocked_partition_does_not_block_others() {
    let (release, gate) = channel();
    let store = BlockingStore {
        inner: MemoryCounterStore::new(),
        gated: key("slow"),
        release: Mutex::new(gate),
    };
    let allocator = CounterAllocator::new(&store);

    scope(|s| {
        let slow = s.spawn(|| allocator.try_allocate(&key("slow")).unwrap());

        // While "slow" is parked inside its update, "fast" keeps allocating.
        for expected in 1..=3u64 {
            assert_eq!(allocator.try_allocate(&key("fast")).unwrap().get(), expected);
        }

        release.send(()).unwrap();
        assert_eq!(slow.join().unwrap().get(), 1);
    });
}

#[test]
fn last_issued_does_not_allocate() {
    let allocator = CounterAllocator::new(MemoryCounterStore::new());
    let year = key("2025");
    assert_eq!(allocator.try_last_issued(&year).unwrap(), None);
    allocator.try_allocate(&year).unwrap();
    assert_eq!(allocator.try_last_issued(&year).unwrap(), Some(Serial::new(1)));
    assert_eq!(allocator.try_allocate(&year).unwrap().get(), 2);
}
