//! Notification publishing.

use crate::{Error, Result};

use async_trait::async_trait;

/// Publishes a message to a topic. Delivery is not confirmed.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `message` to `topic`.
    async fn publish(&self, topic: &str, message: &str) -> Result<()>;
}

/// Publisher backed by Amazon SNS; topics are ARNs.
#[derive(Clone, Debug)]
pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsPublisher {
    /// Publisher using `client`.
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for SnsPublisher {
    #[cfg_attr(
        feature = "instrument",
        tracing::instrument(name = "dynamo_counter.publish", skip(self, message), err)
    )]
    async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        let output = self
            .client
            .publish()
            .topic_arn(topic)
            .message(message)
            .send()
            .await
            .map_err(|e| Error::Publish {
                topic: topic.to_string(),
                source: Box::new(e),
            })?;
        tracing::debug!(topic, message_id = ?output.message_id(), "notification published");
        Ok(())
    }
}
