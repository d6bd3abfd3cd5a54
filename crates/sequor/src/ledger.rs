use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::partition::SEGMENT_SEPARATOR;
use crate::{
    CarryForward, CounterAllocator, CounterStore, Error, PartitionKey, Result, Serial, ZeroSeed,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// How many days back rollover seeding and [`RollingTally::snapshot`] probe
/// for the most recent recorded day.
const LOOKBACK_DAYS: u32 = 366;

const DAY_SCOPE: &str = "day";
const TOTAL_SCOPE: &str = "total";

/// Per-day hit counting with a running total that survives day rollover.
///
/// Every calendar day owns two counters in the shared store: the day's own
/// hit count, which starts at zero, and the running total, which a fresh
/// day seeds from the most recent recorded day (days that recorded nothing
/// are skipped, up to a bounded look-back). Both counters inherit the
/// allocator's guarantees, so concurrent hits are never lost or
/// double-counted.
///
/// # Example
/// ```
/// use sequor::{MemoryCounterStore, RollingTally};
/// use time::macros::date;
///
/// let tally = RollingTally::new(MemoryCounterStore::new());
/// let hit = tally.record(date!(2025 - 01 - 01))?;
/// assert_eq!((hit.day_count, hit.running_total), (1, 1));
/// # Ok::<(), sequor::Error>(())
/// ```
pub struct RollingTally<S>
where
    S: CounterStore + Clone,
{
    per_day: CounterAllocator<S, ZeroSeed>,
    running: CounterAllocator<S, CarryForward<fn(&PartitionKey) -> Vec<PartitionKey>>>,
}

/// A point-in-time view of one day's tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallySnapshot {
    /// The day the counts belong to.
    pub day: Date,
    /// Hits recorded on `day` so far.
    pub day_count: u64,
    /// Hits recorded on `day` and every day before it.
    pub running_total: u64,
}

impl<S> RollingTally<S>
where
    S: CounterStore + Clone,
{
    /// Creates a tally over `store`.
    ///
    /// Clones of the store must share state (as the provided stores do): the
    /// per-day and running counters live side by side in it.
    pub fn new(store: S) -> Self {
        let rollover: CarryForward<fn(&PartitionKey) -> Vec<PartitionKey>> =
            CarryForward::new(prior_total_keys);
        Self {
            per_day: CounterAllocator::new(store.clone()),
            running: CounterAllocator::with_seed(store, rollover),
        }
    }

    /// Records one hit for `day`, returning the updated counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] when either counter cannot be
    /// committed; a failed record contributes to neither count.
    pub fn record(&self, day: Date) -> Result<TallySnapshot> {
        let day_count = self.per_day.try_allocate(&scoped_key(DAY_SCOPE, day)?)?.get();
        let running_total = self.running.try_allocate(&scoped_key(TOTAL_SCOPE, day)?)?.get();
        Ok(TallySnapshot {
            day,
            day_count,
            running_total,
        })
    }

    /// Reads the counts for `day` without taking the write claim.
    ///
    /// A day with no hits yet reports a zero day count and the running total
    /// of the most recent recorded day within the look-back window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] when the store cannot be read.
    pub fn snapshot(&self, day: Date) -> Result<TallySnapshot> {
        let day_count = self
            .per_day
            .try_last_issued(&scoped_key(DAY_SCOPE, day)?)?
            .map_or(0, Serial::get);

        let total_key = scoped_key(TOTAL_SCOPE, day)?;
        let mut running_total = self.running.try_last_issued(&total_key)?.map(Serial::get);
        if running_total.is_none() {
            for candidate in prior_total_keys(&total_key) {
                running_total = self.running.try_last_issued(&candidate)?.map(Serial::get);
                if running_total.is_some() {
                    break;
                }
            }
        }

        Ok(TallySnapshot {
            day,
            day_count,
            running_total: running_total.unwrap_or(0),
        })
    }
}

fn scoped_key(scope: &str, day: Date) -> Result<PartitionKey> {
    let date = day.format(DATE_FORMAT).map_err(|_| Error::InvalidPartitionKey {
        reason: "unformattable day",
    })?;
    PartitionKey::composite([scope, date.as_str()])
}

/// Candidate predecessors for a running-total key, most recent first.
fn prior_total_keys(key: &PartitionKey) -> Vec<PartitionKey> {
    let Some((scope, date)) = key.as_str().split_once(SEGMENT_SEPARATOR) else {
        return Vec::new();
    };
    if scope != TOTAL_SCOPE {
        return Vec::new();
    }
    let Ok(mut day) = Date::parse(date, DATE_FORMAT) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for _ in 0..LOOKBACK_DAYS {
        let Some(previous) = day.previous_day() else {
            break;
        };
        day = previous;
        if let Ok(candidate) = scoped_key(TOTAL_SCOPE, day) {
            candidates.push(candidate);
        }
    }
    candidates
}
