//! Validated client requests.

use std::fmt;

use crate::error::RouteError;

/// Operation kind forwarded to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Put => "PUT",
            Operation::Get => "GET",
            Operation::Delete => "DELETE",
        }
    }

    /// Backend path handling this operation.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Put => "/put",
            Operation::Get => "/get",
            Operation::Delete => "/delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that passed validation: it has a non-empty key and, for
/// `PUT`, a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    op: Operation,
    key: String,
    value: Option<String>,
}

impl Request {
    pub fn put(key: Option<String>, value: Option<String>) -> Result<Self, RouteError> {
        match (key, value) {
            (Some(key), Some(value)) if !key.is_empty() => Ok(Self {
                op: Operation::Put,
                key,
                value: Some(value),
            }),
            _ => Err(RouteError::Malformed(
                "missing key or value in request body".to_string(),
            )),
        }
    }

    pub fn get(key: Option<String>) -> Result<Self, RouteError> {
        Self::keyed(Operation::Get, key)
    }

    pub fn delete(key: Option<String>) -> Result<Self, RouteError> {
        Self::keyed(Operation::Delete, key)
    }

    fn keyed(op: Operation, key: Option<String>) -> Result<Self, RouteError> {
        match key {
            Some(key) if !key.is_empty() => Ok(Self {
                op,
                key,
                value: None,
            }),
            _ => Err(RouteError::Malformed(format!(
                "key is null or missing for {op}"
            ))),
        }
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
