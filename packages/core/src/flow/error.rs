//! Error type surfaced by node executions

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Serialize, Deserialize, JsonSchema, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure or a non-2xx response
    Api,
    /// Missing binary data, malformed JSON, empty required field
    UserInput,
    /// Missing or stale selection, unknown operation
    Configuration,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Api => write!(f, "API"),
            ErrorKind::UserInput => write!(f, "Input"),
            ErrorKind::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Error raised by a node while processing its items.
///
/// `item_index` stays `None` until the dispatcher tags the error with the item
/// that was being processed. Once set it is never overwritten.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error in node '{node}': {message}")]
pub struct NodeError {
    pub kind: ErrorKind,
    pub node: String,
    pub message: String,
    pub item_index: Option<usize>,
    pub http_status: Option<u16>,
    #[source]
    pub cause: Option<BoxError>,
}

impl NodeError {
    pub fn new(kind: ErrorKind, node: &str, message: impl Into<String>) -> Self {
        NodeError {
            kind,
            node: node.to_string(),
            message: message.into(),
            item_index: None,
            http_status: None,
            cause: None,
        }
    }

    pub fn api(node: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, node, message)
    }

    pub fn user_input(node: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserInput, node, message)
    }

    pub fn configuration(node: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, node, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Tags the error with the failing item unless an inner layer already did.
    pub fn at_item(mut self, item_index: usize) -> Self {
        if self.item_index.is_none() {
            self.item_index = Some(item_index);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn to_item_error(&self) -> ItemError {
        ItemError {
            kind: self.kind,
            message: self.to_string(),
            item_index: self.item_index,
            http_status: self.http_status,
            cause: self.cause.as_ref().map(|cause| cause.to_string()),
        }
    }
}

/// Serializable form of a [`NodeError`] attached to an output item.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct ItemError {
    pub kind: ErrorKind,
    pub message: String,
    pub item_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}
