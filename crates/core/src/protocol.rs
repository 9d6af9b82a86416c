// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message protocol between a sync client and its companion process.
//!
//! The protocol is simple:
//! - Client sends requests `{id, type, payload}`
//! - Companion answers each request with `{id, data?, error?}`, echoing the id
//! - Companion pushes unsolicited notifications `{type, payload?}`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::snapshot::Snapshot;

/// Methods a client can invoke on the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read the companion's current snapshot.
    GetData,
    /// Replace the companion's snapshot with the payload.
    SetData,
    /// Round-trip check.
    Ping,
}

impl Method {
    /// Returns the string used in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetData => "getData",
            Method::SetData => "setData",
            Method::Ping => "ping",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "getData" => Ok(Method::GetData),
            "setData" => Ok(Method::SetData),
            "ping" => Ok(Method::Ping),
            _ => Err(Error::UnknownMethod(s.to_string())),
        }
    }
}

/// A request sent from client to companion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    /// Correlation id, echoed in the response.
    pub id: String,
    /// Method name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Method argument.
    #[serde(default)]
    pub payload: Value,
}

impl Request {
    /// Creates a request for a known method.
    pub fn new(id: impl Into<String>, method: Method, payload: Value) -> Self {
        Request { id: id.into(), kind: method.as_str().to_string(), payload }
    }

    /// Parses the method name.
    pub fn method(&self) -> Result<Method> {
        self.kind.parse()
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A response to a [`Request`], correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Id of the originating request.
    pub id: String,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error description on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Creates a success response.
    pub fn ok(id: impl Into<String>, data: Value) -> Self {
        Response { id: id.into(), data: Some(data), error: None }
    }

    /// Creates an error response.
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Response { id: id.into(), data: None, error: Some(message.into()) }
    }

    /// Converts to a result. A response without `error` succeeds, with
    /// `null` data if none was sent.
    pub fn into_result(self) -> std::result::Result<Value, String> {
        match self.error {
            Some(message) => Err(message),
            None => Ok(self.data.unwrap_or(Value::Null)),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Unsolicited notifications pushed by the companion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CompanionEvent {
    /// The companion's data changed; carries its new snapshot.
    DataChanged(Snapshot),
    /// The companion finished applying a write.
    SyncComplete,
    /// The companion detected a conflict on its side.
    ConflictDetected,
    /// The companion hit an error outside any request.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl CompanionEvent {
    /// Creates a DataChanged event.
    pub fn data_changed(snapshot: Snapshot) -> Self {
        CompanionEvent::DataChanged(snapshot)
    }

    /// Creates an Error event.
    pub fn error(message: impl Into<String>) -> Self {
        CompanionEvent::Error { message: message.into() }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Anything a client can receive.
///
/// Frames carrying an `id` are responses; the rest are notifications.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Inbound {
    Response(Response),
    Event(CompanionEvent),
}

impl Inbound {
    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<Response> for Inbound {
    fn from(response: Response) -> Self {
        Inbound::Response(response)
    }
}

impl From<CompanionEvent> for Inbound {
    fn from(event: CompanionEvent) -> Self {
        Inbound::Event(event)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
