//! # Command Envelope
//!
//! The unit of work sent to a peer microservice over the message bus. Each
//! envelope is correlated with exactly one response.

use crate::constants::fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Outbound peer command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Command name the peer pattern-matches on
    pub cmd: String,
    /// Project the command is scoped to, when the peer pattern carries one
    pub subject_id: Option<Uuid>,
    pub payload: Value,
}

impl CommandEnvelope {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            subject_id: None,
            payload: Value::Object(Map::new()),
        }
    }

    pub fn with_subject(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Insert a top-level field into the payload.
    ///
    /// A null payload becomes an object. Returns `false` (payload untouched)
    /// when the payload is a scalar or array and cannot carry named fields.
    pub fn merge_field(&mut self, key: &str, value: Value) -> bool {
        if self.payload.is_null() {
            self.payload = Value::Object(Map::new());
        }
        match self.payload.as_object_mut() {
            Some(map) => {
                map.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Wire form: `{cmd, subjectId?, ...payload}`
    pub fn to_wire(&self) -> Value {
        let mut wire = Map::new();
        wire.insert(fields::CMD.to_string(), Value::String(self.cmd.clone()));
        if let Some(subject_id) = self.subject_id {
            wire.insert(
                fields::SUBJECT_ID.to_string(),
                Value::String(subject_id.to_string()),
            );
        }
        match &self.payload {
            Value::Object(map) => {
                for (key, value) in map {
                    wire.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            Value::Null => {}
            other => {
                wire.insert("data".to_string(), other.clone());
            }
        }
        Value::Object(wire)
    }

    /// Lookup a field of the payload
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
