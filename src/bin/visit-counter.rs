use dynamo_counter::{
    config::Settings,
    counter::{Counter, DynamoCounterStore},
    handler, telemetry,
};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let settings = Settings::from_env()?;
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoCounterStore::new(aws_sdk_dynamodb::Client::new(&config));
    let counter = Counter::new(store, settings.visits())
        .with_strategy(settings.counter_strategy)
        .with_policy(settings.counter_failure_policy);
    let counter = &counter;

    run(service_fn(move |_: LambdaEvent<Value>| async move {
        Ok::<_, Error>(handler::count_visit(counter).await)
    }))
    .await
}
