//! Lambda handlers for the visit and invocation counters.
//!
//! Handlers answer with a [`Response`] whatever happens to the increment, unless the
//! counter runs with [`FailurePolicy::Propagate`](crate::counter::FailurePolicy::Propagate),
//! in which case a failed increment becomes a 500.

use crate::counter::{Counter, CounterStore, Outcome, TOTAL_VISITS};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the visit counter response.
pub const VISIT_COUNTED: &str = "Visit counter incremented successfully!";

/// Body of the invocation counter response.
pub const INVOCATION_COUNTED: &str = "Lambda function executed successfully!";

/// Handler result, serialized as `{"statusCode": ..., "body": ...}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP-style status code.
    pub status_code: u16,
    /// Response text.
    pub body: String,
}

impl Response {
    /// 200 with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    /// 500 with `body`.
    pub fn internal_error(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
        }
    }

    fn from_outcome(outcome: Outcome, body: &str) -> Self {
        match outcome {
            Outcome::Fatal(error) => Self::internal_error(error.to_string()),
            Outcome::Incremented(_) | Outcome::Degraded(_) => Self::ok(body),
        }
    }
}

/// The parts of the invocation context the handlers use.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Invocation {
    /// Name of the invoked function.
    pub function_name: String,
    /// Request id of this invocation.
    pub request_id: String,
}

impl From<&lambda_runtime::Context> for Invocation {
    fn from(context: &lambda_runtime::Context) -> Self {
        Self {
            function_name: context.env_config.function_name.clone(),
            request_id: context.request_id.clone(),
        }
    }
}

/// Count one site visit.
pub async fn count_visit<S: CounterStore>(counter: &Counter<S>) -> Response {
    let outcome = counter.increment(TOTAL_VISITS).await;
    Response::from_outcome(outcome, VISIT_COUNTED)
}

/// Log the event and count one invocation of the invoked function.
pub async fn count_invocation<S: CounterStore>(
    counter: &Counter<S>,
    event: &Value,
    invocation: &Invocation,
) -> Response {
    tracing::info!(
        request_id = %invocation.request_id,
        function_name = %invocation.function_name,
        %event,
        "invocation received"
    );
    let outcome = counter.increment(&invocation.function_name).await;
    Response::from_outcome(outcome, INVOCATION_COUNTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{CounterTable, FailurePolicy, MemoryCounterStore, tests::FailingStore};

    use rstest::rstest;
    use serde_json::json;

    fn invocation() -> Invocation {
        Invocation {
            function_name: "YourFunctionName".to_string(),
            request_id: "YourRequestID".to_string(),
        }
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_value(Response::ok(VISIT_COUNTED)).unwrap(),
            json!({
                "statusCode": 200,
                "body": "Visit counter incremented successfully!"
            })
        );
    }

    #[tokio::test]
    async fn test_count_visit() {
        let counter = Counter::new(
            MemoryCounterStore::new(),
            CounterTable::visits("VisitCounter"),
        );
        assert_eq!(count_visit(&counter).await, Response::ok(VISIT_COUNTED));
        count_visit(&counter).await;
        assert_eq!(
            counter
                .store()
                .get(counter.table(), TOTAL_VISITS)
                .await
                .unwrap()
                .map(|record| record.count),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_count_invocation_uses_function_name() {
        let counter = Counter::new(
            MemoryCounterStore::new(),
            CounterTable::invocations("InvocationCounter"),
        );
        let event = json!({"key1": "value1", "key2": "value2"});
        assert_eq!(
            count_invocation(&counter, &event, &invocation()).await,
            Response::ok(INVOCATION_COUNTED)
        );
        assert_eq!(
            counter
                .store()
                .get(counter.table(), "YourFunctionName")
                .await
                .unwrap()
                .map(|record| record.count),
            Some(1)
        );
    }

    #[rstest]
    #[case::visit(true)]
    #[case::invocation(false)]
    #[tokio::test]
    async fn test_suppressed_failure_still_succeeds(#[case] visit: bool) {
        let counter = Counter::new(FailingStore, CounterTable::visits("VisitCounter"));
        let response = if visit {
            count_visit(&counter).await
        } else {
            count_invocation(&counter, &Value::Null, &invocation()).await
        };
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_propagated_failure_is_500() {
        let counter = Counter::new(FailingStore, CounterTable::visits("VisitCounter"))
            .with_policy(FailurePolicy::Propagate);
        assert_eq!(
            count_visit(&counter).await,
            Response::internal_error(
                "UpdateItem on table VisitCounter failed: service unavailable"
            )
        );
    }

    #[tokio::test]
    async fn test_empty_function_name_is_degraded() {
        let counter = Counter::new(
            MemoryCounterStore::new(),
            CounterTable::invocations("InvocationCounter"),
        );
        let response = count_invocation(&counter, &Value::Null, &Invocation::default()).await;
        assert_eq!(response, Response::ok(INVOCATION_COUNTED));
    }
}
