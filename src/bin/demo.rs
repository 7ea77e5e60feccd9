use clap::{Parser, Subcommand};
use dynamo_counter::{
    config::Settings,
    counter::{Counter, DynamoCounterStore},
    handler::{self, Invocation},
    notify::SnsPublisher,
    orders::{Order, OrderKey, OrderStatus, SortOrder},
    posts::Post,
    telemetry,
};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "demo", about = "Order, post and counter demos against DynamoDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert an order
    Insert {
        #[arg(long, default_value = "cus-03")]
        customer_id: String,
        #[arg(long, default_value = "ord-1")]
        order_id: String,
        #[arg(long, default_value = "processed")]
        status: OrderStatus,
    },

    /// Scan the whole table for orders in a status
    Scan {
        #[arg(long, default_value = "pending")]
        status: OrderStatus,
    },

    /// Query the orders of a customer
    QueryCustomer {
        #[arg(long, default_value = "cus-01")]
        customer_id: String,
        /// Newest order first
        #[arg(long)]
        descending: bool,
    },

    /// Query orders in a status through the status index
    QueryStatus {
        #[arg(long, default_value = "pending")]
        status: OrderStatus,
    },

    /// Query one order by customer and order id
    QueryOrder {
        #[arg(long, default_value = "cus-01")]
        customer_id: String,
        #[arg(long, default_value = "ord-1")]
        order_id: String,
    },

    /// Set the status of an order
    UpdateStatus {
        #[arg(long, default_value = "cus-02")]
        customer_id: String,
        #[arg(long, default_value = "ord-3")]
        order_id: String,
        #[arg(long, default_value = "completed")]
        status: OrderStatus,
    },

    /// Delete orders, given as customer_id:order_id
    BatchDelete {
        #[arg(
            long = "key",
            value_parser = parse_order_key,
            default_values = ["cus-04:ord-4", "cus-05:ord-4"]
        )]
        keys: Vec<OrderKey>,
    },

    /// Insert a post and announce it on NOTIFY_TOPIC_ARN
    InsertPost {
        #[arg(long, default_value = "dummy-12")]
        user_name: String,
        #[arg(long, default_value = "dummy12@email.com")]
        email_id: String,
        #[arg(long, default_value = "active")]
        status: String,
    },

    /// Run the visit counter handler once
    CountVisit,

    /// Run the invocation counter handler once with a sample event
    CountInvocation {
        #[arg(long, default_value = "YourFunctionName")]
        function_name: String,
    },
}

fn parse_order_key(value: &str) -> Result<OrderKey, String> {
    match value.split_once(':') {
        Some((customer_id, order_id)) if !customer_id.is_empty() && !order_id.is_empty() => {
            Ok(OrderKey::new(customer_id, order_id))
        }
        _ => Err(format!("expected customer_id:order_id, got {value:?}")),
    }
}

fn print<T: Serialize>(values: &[T]) -> Result<(), serde_json::Error> {
    for value in values {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

async fn execute(command: Commands, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let orders = settings.orders();

    match command {
        Commands::Insert {
            customer_id,
            order_id,
            status,
        } => {
            orders
                .insert(&client, Order::new(customer_id, order_id, status))
                .await?;
        }
        Commands::Scan { status } => {
            print(&orders.scan_by_status(&client, status).await?)?;
        }
        Commands::QueryCustomer {
            customer_id,
            descending,
        } => {
            let order = if descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            print(&orders.query_by_customer(&client, &customer_id, order).await?)?;
        }
        Commands::QueryStatus { status } => {
            print(&orders.query_by_status(&client, status).await?)?;
        }
        Commands::QueryOrder {
            customer_id,
            order_id,
        } => {
            print(
                &orders
                    .query_by_customer_and_order(&client, &customer_id, &order_id)
                    .await?,
            )?;
        }
        Commands::UpdateStatus {
            customer_id,
            order_id,
            status,
        } => {
            let update = orders
                .update_status(&client, OrderKey::new(customer_id, order_id), status)
                .await?;
            println!("{update:?}");
        }
        Commands::BatchDelete { keys } => {
            let unprocessed = orders.batch_delete(&client, keys).await?;
            println!("unprocessed deletes: {unprocessed}");
        }
        Commands::InsertPost {
            user_name,
            email_id,
            status,
        } => {
            let publisher = SnsPublisher::new(aws_sdk_sns::Client::new(&config));
            let notified = settings
                .posts()
                .insert_and_notify(&client, &publisher, Post::new(user_name, email_id, status))
                .await?;
            println!("notified: {notified}");
        }
        Commands::CountVisit => {
            let counter = Counter::new(DynamoCounterStore::new(client), settings.visits())
                .with_strategy(settings.counter_strategy)
                .with_policy(settings.counter_failure_policy);
            print(&[handler::count_visit(&counter).await])?;
        }
        Commands::CountInvocation { function_name } => {
            let counter = Counter::new(DynamoCounterStore::new(client), settings.invocations())
                .with_strategy(settings.counter_strategy)
                .with_policy(settings.counter_failure_policy);
            let event = json!({"key1": "value1", "key2": "value2"});
            let invocation = Invocation {
                function_name,
                request_id: "local".to_string(),
            };
            print(&[handler::count_invocation(&counter, &event, &invocation).await])?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    execute(cli.command, settings).await
}
