//! Error type shared by the counter, the demo tables and the notifier.

use std::{error, fmt};

/// Boxed source error from an AWS client.
pub type BoxError = Box<dyn error::Error + Send + Sync>;

/// Backing-store call that failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// `BatchWriteItem`
    BatchWriteItem,
    /// `GetItem`
    GetItem,
    /// `PutItem`
    PutItem,
    /// `Query`
    Query,
    /// `Scan`
    Scan,
    /// `UpdateItem`
    UpdateItem,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BatchWriteItem => "BatchWriteItem",
            Self::GetItem => "GetItem",
            Self::PutItem => "PutItem",
            Self::Query => "Query",
            Self::Scan => "Scan",
            Self::UpdateItem => "UpdateItem",
        };
        f.write_str(name)
    }
}

/// Errors raised by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A call to the backing store failed (network, throttling, validation, ...).
    #[error("{operation} on table {table} failed: {source}")]
    Store {
        /// The call that failed.
        operation: Operation,
        /// The table it was addressed to.
        table: String,
        /// The client error.
        #[source]
        source: BoxError,
    },

    /// A stored record does not match its table schema.
    #[error("malformed record {identity:?} in table {table}: {reason}")]
    MalformedRecord {
        /// The table the record was read from.
        table: String,
        /// The record identity (partition key value).
        identity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Counter identities must be non-empty.
    #[error("counter identity must not be empty")]
    EmptyIdentity,

    /// The counter already holds the largest representable value.
    #[error("counter {identity:?} cannot be incremented past {value}")]
    Overflow {
        /// The counter identity.
        identity: String,
        /// The stored value.
        value: u64,
    },

    /// A value could not be converted to or from a DynamoDB attribute value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_dynamo::Error),

    /// A request could not be built by the SDK.
    #[error("request build error: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),

    /// Publishing a notification failed.
    #[error("publishing to {topic} failed: {source}")]
    Publish {
        /// The topic identifier.
        topic: String,
        /// The client error.
        #[source]
        source: BoxError,
    },

    /// A setting could not be read or parsed.
    #[error("invalid setting {name}: {reason}")]
    Config {
        /// The environment variable.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl Error {
    pub(crate) fn store<E>(operation: Operation, table: impl Into<String>, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self::Store {
            operation,
            table: table.into(),
            source: Box::new(source),
        }
    }
}

/// Result with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
