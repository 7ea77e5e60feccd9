use crate::common;

use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};

/// A single key attribute.
///
/// ```rust
/// use dynamo_counter::common::key;
///
/// let key = key::Key::new("customer_id", "cus-01".to_string());
/// assert_eq!(key.name, "customer_id");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

impl<T> Key<T> {
    /// Key attribute `name` holding `value`.
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Primary key: partition key and, for composite tables, a sort key.
///
/// ```rust
/// use dynamo_counter::common::key;
///
/// let keys = key::Keys::partition("customer_id", "cus-04".to_string())
///     .with_sort("order_id", "ord-4".to_string());
/// assert!(keys.sort_key.is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys<T> {
    /// The partition key (required).
    pub partition_key: Key<T>,
    /// The sort key (only for tables with composite primary keys).
    pub sort_key: Option<Key<T>>,
}

impl<T> Keys<T> {
    /// Primary key made of a partition key only.
    pub fn partition(name: impl Into<String>, value: T) -> Self {
        Self {
            partition_key: Key::new(name, value),
            sort_key: None,
        }
    }

    /// Add (or replace) the sort key.
    pub fn with_sort(mut self, name: impl Into<String>, value: T) -> Self {
        self.sort_key = Some(Key::new(name, value));
        self
    }
}

impl<T: Serialize> TryFrom<Keys<T>> for common::Item {
    type Error = Error;

    fn try_from(keys: Keys<T>) -> Result<Self> {
        let partition_value = to_attribute_value(keys.partition_key.value)?;
        let mut item = Self::from([(keys.partition_key.name, partition_value)]);
        if let Some(sort_key) = keys.sort_key {
            let sort_value = to_attribute_value(sort_key.value)?;
            item.insert(sort_key.name, sort_value);
        }
        Ok(item)
    }
}
