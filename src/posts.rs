//! Post table demo: insert a post and announce it on a topic.

use crate::{Error, Result, error::Operation, notify::Publisher, write};

use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Post {
    /// Partition key.
    pub user_name: String,
    /// Contact address.
    pub email_id: String,
    /// Account state, e.g. `active`.
    pub status: String,
    /// Creation time.
    pub created_date: DateTime<Utc>,
}

impl Post {
    /// New post created now.
    pub fn new(
        user_name: impl Into<String>,
        email_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            email_id: email_id.into(),
            status: status.into(),
            created_date: Utc::now(),
        }
    }
}

/// Post table and the topic new posts are announced on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PostTable {
    /// The table name.
    pub table_name: String,
    /// Topic to notify after an insert; `None` disables notifications.
    pub topic: Option<String>,
}

impl PostTable {
    /// Table `table_name` announcing on `topic`.
    pub fn new(table_name: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            table_name: table_name.into(),
            topic,
        }
    }

    /// Notification text for a new post.
    pub fn new_post_message(&self) -> String {
        format!("New post inserted into {} table", self.table_name)
    }

    /// Put request for `post`.
    pub fn insert_request(&self, post: Post) -> write::put_item::PutItem<Post> {
        write::put_item::PutItem {
            item: post,
            write_args: write::common::WriteArgs {
                table_name: self.table_name.clone(),
                ..Default::default()
            },
        }
    }

    /// Announce a new post. Returns whether a notification was published.
    pub async fn notify<P: Publisher + ?Sized>(&self, publisher: &P) -> Result<bool> {
        let Some(topic) = &self.topic else {
            tracing::debug!(table = %self.table_name, "no topic configured, skipping notification");
            return Ok(false);
        };
        publisher.publish(topic, &self.new_post_message()).await?;
        Ok(true)
    }

    /// Insert `post`, then announce it.
    pub async fn insert_and_notify<P: Publisher + ?Sized>(
        &self,
        client: &Client,
        publisher: &P,
        post: Post,
    ) -> Result<bool> {
        let user_name = post.user_name.clone();
        self.insert_request(post)
            .send(client)
            .await
            .map_err(|e| Error::store(Operation::PutItem, &self.table_name, e))?;
        tracing::info!(table = %self.table_name, user_name = %user_name, "post inserted");
        self.notify(publisher).await
    }
}
