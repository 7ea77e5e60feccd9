//! Settings read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `VISIT_COUNTER_TABLE` | `VisitCounter` |
//! | `INVOCATION_COUNTER_TABLE` | `InvocationCounter` |
//! | `ORDERS_TABLE` | `demo-dynamo-python` |
//! | `ORDERS_STATUS_INDEX` | `status-index` |
//! | `POSTS_TABLE` | `Instagram_Post` |
//! | `NOTIFY_TOPIC_ARN` | unset (no notifications) |
//! | `COUNTER_STRATEGY` | `atomic` (or `read-then-write`) |
//! | `COUNTER_FAILURE_POLICY` | `suppress` (or `propagate`) |
//!
//! AWS credentials and region come from the usual `aws-config` provider chain.

use crate::{
    Error, Result,
    counter::{CounterTable, FailurePolicy, IncrementStrategy},
    orders::OrderTable,
    posts::PostTable,
};

use std::{env, str};

/// Deployment settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Visit counter table, keyed by `CounterName`.
    pub visit_counter_table: String,
    /// Invocation counter table, keyed by `FunctionName`.
    pub invocation_counter_table: String,
    /// Order table.
    pub orders_table: String,
    /// Status index of the order table.
    pub orders_status_index: String,
    /// Post table.
    pub posts_table: String,
    /// Topic announcing new posts.
    pub notify_topic_arn: Option<String>,
    /// How counters are incremented.
    pub counter_strategy: IncrementStrategy,
    /// What a failed increment means.
    pub counter_failure_policy: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visit_counter_table: "VisitCounter".to_string(),
            invocation_counter_table: "InvocationCounter".to_string(),
            orders_table: "demo-dynamo-python".to_string(),
            orders_status_index: "status-index".to_string(),
            posts_table: "Instagram_Post".to_string(),
            notify_topic_arn: None,
            counter_strategy: IncrementStrategy::default(),
            counter_failure_policy: FailurePolicy::default(),
        }
    }
}

impl Settings {
    /// Settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Settings from `lookup`; unset and empty variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let defaults = Self::default();
        Ok(Self {
            visit_counter_table: var("VISIT_COUNTER_TABLE")
                .unwrap_or(defaults.visit_counter_table),
            invocation_counter_table: var("INVOCATION_COUNTER_TABLE")
                .unwrap_or(defaults.invocation_counter_table),
            orders_table: var("ORDERS_TABLE").unwrap_or(defaults.orders_table),
            orders_status_index: var("ORDERS_STATUS_INDEX")
                .unwrap_or(defaults.orders_status_index),
            posts_table: var("POSTS_TABLE").unwrap_or(defaults.posts_table),
            notify_topic_arn: var("NOTIFY_TOPIC_ARN"),
            counter_strategy: parse_or(var("COUNTER_STRATEGY"), defaults.counter_strategy)?,
            counter_failure_policy: parse_or(
                var("COUNTER_FAILURE_POLICY"),
                defaults.counter_failure_policy,
            )?,
        })
    }

    /// Visit counter schema.
    pub fn visits(&self) -> CounterTable {
        CounterTable::visits(self.visit_counter_table.as_str())
    }

    /// Invocation counter schema.
    pub fn invocations(&self) -> CounterTable {
        CounterTable::invocations(self.invocation_counter_table.as_str())
    }

    /// Order table.
    pub fn orders(&self) -> OrderTable {
        OrderTable::new(
            self.orders_table.as_str(),
            self.orders_status_index.as_str(),
        )
    }

    /// Post table.
    pub fn posts(&self) -> PostTable {
        PostTable::new(self.posts_table.as_str(), self.notify_topic_arn.clone())
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: str::FromStr<Err = Error>,
{
    value.map_or(Ok(default), |value| value.parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: collections::HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(settings(&[]).unwrap(), Settings::default());
    }

    #[test]
    fn test_overrides() {
        let actual = settings(&[
            ("VISIT_COUNTER_TABLE", "Counters"),
            ("INVOCATION_COUNTER_TABLE", "Invocations"),
            ("ORDERS_TABLE", "orders"),
            ("ORDERS_STATUS_INDEX", "by-status"),
            ("POSTS_TABLE", "posts"),
            ("NOTIFY_TOPIC_ARN", "arn:aws:sns:eu-west-1:000000000000:posts"),
            ("COUNTER_STRATEGY", "read-then-write"),
            ("COUNTER_FAILURE_POLICY", "propagate"),
        ])
        .unwrap();
        assert_eq!(
            actual,
            Settings {
                visit_counter_table: "Counters".to_string(),
                invocation_counter_table: "Invocations".to_string(),
                orders_table: "orders".to_string(),
                orders_status_index: "by-status".to_string(),
                posts_table: "posts".to_string(),
                notify_topic_arn: Some("arn:aws:sns:eu-west-1:000000000000:posts".to_string()),
                counter_strategy: IncrementStrategy::ReadThenWrite,
                counter_failure_policy: FailurePolicy::Propagate,
            }
        );
        assert_eq!(actual.visits(), CounterTable::visits("Counters"));
        assert_eq!(actual.invocations(), CounterTable::invocations("Invocations"));
        assert_eq!(actual.orders(), OrderTable::new("orders", "by-status"));
    }

    #[test]
    fn test_empty_value_uses_default() {
        let actual = settings(&[("NOTIFY_TOPIC_ARN", ""), ("COUNTER_STRATEGY", "")]).unwrap();
        assert_eq!(actual.notify_topic_arn, None);
        assert_eq!(actual.counter_strategy, IncrementStrategy::Atomic);
    }

    #[test]
    fn test_counter_families_use_separate_tables() {
        let settings = Settings::default();
        assert_ne!(settings.visits().table_name, settings.invocations().table_name);
    }

    #[rstest]
    #[case::strategy("COUNTER_STRATEGY", "fast")]
    #[case::policy("COUNTER_FAILURE_POLICY", "retry")]
    fn test_invalid_value(#[case] name: &str, #[case] value: &str) {
        match settings(&[(name, value)]) {
            Err(Error::Config { name: actual, .. }) => assert_eq!(actual, name),
            other => panic!("expected a config error, got {other:?}"),
        }
    }
}
