//! Counter records and the increment operation.
//!
//! A counter is a record identified by a string key whose count goes up by one per
//! logical event. [`Counter`] pairs a [`CounterStore`] with a [`CounterTable`] schema and
//! chooses how an increment reaches the store:
//!
//! - [`IncrementStrategy::ReadThenWrite`] fetches the record, adds one and puts it back.
//!   Two increments of the same identity that overlap can both read `v` and both write
//!   `v + 1`.
//! - [`IncrementStrategy::Atomic`] asks the store to add one in a single call. This is the
//!   default.
//!
//! ```rust
//! use dynamo_counter::counter::{Counter, CounterTable, MemoryCounterStore, Outcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let counter = Counter::new(MemoryCounterStore::new(), CounterTable::visits("VisitCounter"));
//! assert!(matches!(counter.increment("TotalVisits").await, Outcome::Incremented(1)));
//! assert!(matches!(counter.increment("TotalVisits").await, Outcome::Incremented(2)));
//! # }
//! ```

mod memory;
mod store;
mod table;

pub use memory::MemoryCounterStore;
pub use store::{CounterStore, DynamoCounterStore};
pub use table::{CounterTable, TOTAL_VISITS};

use crate::{Error, Result};

use std::{fmt, str};

/// Typed counter record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CounterRecord {
    /// Partition key value.
    pub identity: String,
    /// Number of completed increments.
    pub count: u64,
}

/// How an increment reaches the store.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IncrementStrategy {
    /// `get`, add one, `put`. Concurrent increments of one identity can be lost.
    ReadThenWrite,
    /// A single atomic `add`.
    #[default]
    Atomic,
}

impl str::FromStr for IncrementStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read-then-write" => Ok(Self::ReadThenWrite),
            "atomic" => Ok(Self::Atomic),
            other => Err(Error::Config {
                name: "COUNTER_STRATEGY".to_string(),
                reason: format!("expected atomic or read-then-write, got {other:?}"),
            }),
        }
    }
}

/// What a failed increment means for the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Log the failure and carry on: the outcome is [`Outcome::Degraded`].
    #[default]
    Suppress,
    /// Log the failure and report it: the outcome is [`Outcome::Fatal`].
    Propagate,
}

impl str::FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "suppress" => Ok(Self::Suppress),
            "propagate" => Ok(Self::Propagate),
            other => Err(Error::Config {
                name: "COUNTER_FAILURE_POLICY".to_string(),
                reason: format!("expected suppress or propagate, got {other:?}"),
            }),
        }
    }
}

/// Result of [`Counter::increment`].
#[derive(Debug)]
pub enum Outcome {
    /// The new count.
    Incremented(u64),
    /// The increment failed and was suppressed.
    Degraded(Error),
    /// The increment failed and must be reported.
    Fatal(Error),
}

impl Outcome {
    /// New count, if the increment succeeded.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Incremented(count) => Some(*count),
            Self::Degraded(_) | Self::Fatal(_) => None,
        }
    }

    /// Whether the caller must report a failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incremented(count) => write!(f, "incremented to {count}"),
            Self::Degraded(error) => write!(f, "degraded: {error}"),
            Self::Fatal(error) => write!(f, "fatal: {error}"),
        }
    }
}

/// Counter accessor. Holds no state between calls beyond its configuration.
#[derive(Clone, Debug)]
pub struct Counter<S> {
    store: S,
    table: CounterTable,
    strategy: IncrementStrategy,
    policy: FailurePolicy,
}

impl<S: CounterStore> Counter<S> {
    /// Counter over `table` in `store` with the default strategy and policy.
    pub fn new(store: S, table: CounterTable) -> Self {
        Self {
            store,
            table,
            strategy: IncrementStrategy::default(),
            policy: FailurePolicy::default(),
        }
    }

    /// Use `strategy` for increments.
    pub fn with_strategy(mut self, strategy: IncrementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Use `policy` for failures.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The table schema.
    pub fn table(&self) -> &CounterTable {
        &self.table
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Increment `identity` by one and return the new count.
    pub async fn try_increment(&self, identity: &str) -> Result<u64> {
        if identity.is_empty() {
            return Err(Error::EmptyIdentity);
        }
        match self.strategy {
            IncrementStrategy::ReadThenWrite => {
                let count = match self.store.get(&self.table, identity).await? {
                    None => 1,
                    Some(record) => {
                        record.count.checked_add(1).ok_or_else(|| Error::Overflow {
                            identity: identity.to_string(),
                            value: record.count,
                        })?
                    }
                };
                let record = CounterRecord {
                    identity: identity.to_string(),
                    count,
                };
                self.store.put(&self.table, &record).await?;
                Ok(count)
            }
            IncrementStrategy::Atomic => self.store.add(&self.table, identity, 1).await,
        }
    }

    /// Increment `identity` by one. Failures are logged and reported per the failure policy.
    pub async fn increment(&self, identity: &str) -> Outcome {
        match self.try_increment(identity).await {
            Ok(count) => {
                tracing::info!(
                    table = %self.table.table_name,
                    identity,
                    count,
                    "counter incremented"
                );
                Outcome::Incremented(count)
            }
            Err(error) => {
                tracing::error!(
                    table = %self.table.table_name,
                    identity,
                    %error,
                    "counter increment failed"
                );
                match self.policy {
                    FailurePolicy::Suppress => Outcome::Degraded(error),
                    FailurePolicy::Propagate => Outcome::Fatal(error),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{common, error::Operation};

    use async_trait::async_trait;
    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::{io, sync::Arc};
    use tokio::sync::Barrier;

    /// Store whose every call fails.
    pub(crate) struct FailingStore;

    fn unavailable(operation: Operation, table: &CounterTable) -> Error {
        Error::store(
            operation,
            &table.table_name,
            io::Error::other("service unavailable"),
        )
    }

    #[async_trait]
    impl CounterStore for FailingStore {
        async fn get(&self, table: &CounterTable, _: &str) -> Result<Option<CounterRecord>> {
            Err(unavailable(Operation::GetItem, table))
        }

        async fn put(&self, table: &CounterTable, _: &CounterRecord) -> Result<()> {
            Err(unavailable(Operation::PutItem, table))
        }

        async fn add(&self, table: &CounterTable, _: &str, _: u64) -> Result<u64> {
            Err(unavailable(Operation::UpdateItem, table))
        }
    }

    /// Reads succeed, writes fail.
    struct ReadOnlyStore(MemoryCounterStore);

    #[async_trait]
    impl CounterStore for ReadOnlyStore {
        async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>> {
            self.0.get(table, identity).await
        }

        async fn put(&self, table: &CounterTable, _: &CounterRecord) -> Result<()> {
            Err(unavailable(Operation::PutItem, table))
        }

        async fn add(&self, table: &CounterTable, _: &str, _: u64) -> Result<u64> {
            Err(unavailable(Operation::UpdateItem, table))
        }
    }

    /// Holds every `get` until `parties` reads are in flight, so overlapping
    /// read-then-write increments all see the same prior value.
    struct OverlappingReads {
        inner: MemoryCounterStore,
        barrier: Barrier,
    }

    impl OverlappingReads {
        fn new(inner: MemoryCounterStore, parties: usize) -> Self {
            Self {
                inner,
                barrier: Barrier::new(parties),
            }
        }
    }

    #[async_trait]
    impl CounterStore for OverlappingReads {
        async fn get(&self, table: &CounterTable, identity: &str) -> Result<Option<CounterRecord>> {
            let record = self.inner.get(table, identity).await;
            self.barrier.wait().await;
            record
        }

        async fn put(&self, table: &CounterTable, record: &CounterRecord) -> Result<()> {
            self.inner.put(table, record).await
        }

        async fn add(&self, table: &CounterTable, identity: &str, delta: u64) -> Result<u64> {
            self.inner.add(table, identity, delta).await
        }
    }

    fn visits() -> CounterTable {
        CounterTable::visits("VisitCounter")
    }

    async fn seeded(count: u64) -> MemoryCounterStore {
        let store = MemoryCounterStore::new();
        store
            .put(
                &visits(),
                &CounterRecord {
                    identity: TOTAL_VISITS.to_string(),
                    count,
                },
            )
            .await
            .unwrap();
        store
    }

    #[rstest]
    #[case::read_then_write(IncrementStrategy::ReadThenWrite)]
    #[case::atomic(IncrementStrategy::Atomic)]
    #[tokio::test]
    async fn test_first_increment_creates_record(#[case] strategy: IncrementStrategy) {
        let counter = Counter::new(MemoryCounterStore::new(), visits()).with_strategy(strategy);
        assert_eq!(counter.try_increment("fresh").await.unwrap(), 1);
        assert_eq!(
            counter.store().get(&visits(), "fresh").await.unwrap(),
            Some(CounterRecord {
                identity: "fresh".to_string(),
                count: 1,
            })
        );
    }

    #[rstest]
    #[case::read_then_write(IncrementStrategy::ReadThenWrite, 0)]
    #[case::atomic(IncrementStrategy::Atomic, 0)]
    #[case::read_then_write_existing(IncrementStrategy::ReadThenWrite, 41)]
    #[case::atomic_existing(IncrementStrategy::Atomic, 41)]
    #[tokio::test]
    async fn test_existing_value_is_incremented(
        #[case] strategy: IncrementStrategy,
        #[case] stored: u64,
    ) {
        let counter = Counter::new(seeded(stored).await, visits()).with_strategy(strategy);
        assert_eq!(counter.try_increment(TOTAL_VISITS).await.unwrap(), stored + 1);
        assert_eq!(
            counter
                .store()
                .get(&visits(), TOTAL_VISITS)
                .await
                .unwrap()
                .map(|record| record.count),
            Some(stored + 1)
        );
    }

    #[rstest]
    #[case::read_then_write(IncrementStrategy::ReadThenWrite)]
    #[case::atomic(IncrementStrategy::Atomic)]
    #[tokio::test]
    async fn test_sequential_increments(#[case] strategy: IncrementStrategy) {
        let counter = Counter::new(MemoryCounterStore::new(), visits()).with_strategy(strategy);
        for expected in 1..=10 {
            assert!(matches!(
                counter.increment(TOTAL_VISITS).await,
                Outcome::Incremented(count) if count == expected
            ));
        }
        assert_eq!(
            counter
                .store()
                .get(&visits(), TOTAL_VISITS)
                .await
                .unwrap()
                .map(|record| record.count),
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_total_visits_item_shape() {
        let counter = Counter::new(MemoryCounterStore::new(), visits());
        for count in 1..=2 {
            counter.try_increment(TOTAL_VISITS).await.unwrap();
            assert_eq!(
                counter.store().item(&visits(), TOTAL_VISITS).await,
                Some(common::Item::from([
                    (
                        "CounterName".to_string(),
                        types::AttributeValue::S(TOTAL_VISITS.to_string())
                    ),
                    (
                        "Count".to_string(),
                        types::AttributeValue::N(count.to_string())
                    ),
                ]))
            );
        }
    }

    #[tokio::test]
    async fn test_read_then_write_loses_overlapping_update() {
        let store = Arc::new(OverlappingReads::new(seeded(5).await, 2));
        let first = Counter::new(Arc::clone(&store), visits())
            .with_strategy(IncrementStrategy::ReadThenWrite);
        let second = Counter::new(Arc::clone(&store), visits())
            .with_strategy(IncrementStrategy::ReadThenWrite);

        let (a, b) = tokio::join!(
            first.try_increment(TOTAL_VISITS),
            second.try_increment(TOTAL_VISITS)
        );
        assert_eq!((a.unwrap(), b.unwrap()), (6, 6));
        assert_eq!(
            store
                .get(&visits(), TOTAL_VISITS)
                .await
                .unwrap()
                .map(|record| record.count),
            Some(6)
        );
    }

    #[tokio::test]
    async fn test_atomic_keeps_overlapping_update() {
        let store = Arc::new(OverlappingReads::new(seeded(5).await, 2));
        let first = Counter::new(Arc::clone(&store), visits());
        let second = Counter::new(Arc::clone(&store), visits());

        let (a, b) = tokio::join!(
            first.try_increment(TOTAL_VISITS),
            second.try_increment(TOTAL_VISITS)
        );
        let mut counts = [a.unwrap(), b.unwrap()];
        counts.sort_unstable();
        assert_eq!(counts, [6, 7]);
        assert_eq!(
            store
                .inner
                .get(&visits(), TOTAL_VISITS)
                .await
                .unwrap()
                .map(|record| record.count),
            Some(7)
        );
    }

    #[rstest]
    #[case::read_then_write(IncrementStrategy::ReadThenWrite)]
    #[case::atomic(IncrementStrategy::Atomic)]
    #[tokio::test]
    async fn test_store_failure_is_suppressed(#[case] strategy: IncrementStrategy) {
        let counter = Counter::new(FailingStore, visits()).with_strategy(strategy);
        let outcome = counter.increment(TOTAL_VISITS).await;
        assert!(matches!(outcome, Outcome::Degraded(Error::Store { .. })));
        assert!(!outcome.is_fatal());
        assert_eq!(outcome.count(), None);
    }

    #[tokio::test]
    async fn test_write_failure_is_suppressed() {
        let counter = Counter::new(ReadOnlyStore(seeded(3).await), visits())
            .with_strategy(IncrementStrategy::ReadThenWrite);
        let outcome = counter.increment(TOTAL_VISITS).await;
        assert!(matches!(
            outcome,
            Outcome::Degraded(Error::Store {
                operation: Operation::PutItem,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal_when_propagated() {
        let counter =
            Counter::new(FailingStore, visits()).with_policy(FailurePolicy::Propagate);
        let outcome = counter.increment(TOTAL_VISITS).await;
        assert!(outcome.is_fatal());
        assert_eq!(
            outcome.to_string(),
            "fatal: UpdateItem on table VisitCounter failed: service unavailable"
        );
    }

    #[rstest]
    #[case::read_then_write(IncrementStrategy::ReadThenWrite)]
    #[case::atomic(IncrementStrategy::Atomic)]
    #[tokio::test]
    async fn test_malformed_count_is_degraded(#[case] strategy: IncrementStrategy) {
        let store = MemoryCounterStore::new();
        store
            .insert_item(
                &visits(),
                TOTAL_VISITS,
                common::Item::from([
                    (
                        "CounterName".to_string(),
                        types::AttributeValue::S(TOTAL_VISITS.to_string()),
                    ),
                    (
                        "Count".to_string(),
                        types::AttributeValue::N("abc".to_string()),
                    ),
                ]),
            )
            .await;
        let counter = Counter::new(store, visits()).with_strategy(strategy);
        assert!(matches!(
            counter.increment(TOTAL_VISITS).await,
            Outcome::Degraded(Error::MalformedRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_identity_is_rejected() {
        let counter = Counter::new(MemoryCounterStore::new(), visits());
        assert!(matches!(
            counter.increment("").await,
            Outcome::Degraded(Error::EmptyIdentity)
        ));
        assert_eq!(counter.store().item(&visits(), "").await, None);
    }

    #[tokio::test]
    async fn test_read_then_write_overflow() {
        let counter = Counter::new(seeded(u64::MAX).await, visits())
            .with_strategy(IncrementStrategy::ReadThenWrite);
        assert!(matches!(
            counter.try_increment(TOTAL_VISITS).await,
            Err(Error::Overflow { .. })
        ));
    }

    #[rstest]
    #[case::atomic("atomic", IncrementStrategy::Atomic)]
    #[case::read_then_write("read-then-write", IncrementStrategy::ReadThenWrite)]
    fn test_parse_strategy(#[case] value: &str, #[case] expected: IncrementStrategy) {
        assert_eq!(value.parse::<IncrementStrategy>().unwrap(), expected);
    }

    #[rstest]
    #[case::suppress("suppress", FailurePolicy::Suppress)]
    #[case::propagate("propagate", FailurePolicy::Propagate)]
    fn test_parse_policy(#[case] value: &str, #[case] expected: FailurePolicy) {
        assert_eq!(value.parse::<FailurePolicy>().unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            "sometimes".parse::<IncrementStrategy>(),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            "ignore".parse::<FailurePolicy>(),
            Err(Error::Config { .. })
        ));
    }
}
