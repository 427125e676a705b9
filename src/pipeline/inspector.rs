//! Recursive malicious-content scan over parsed JSON.
//!
//! Strings are matched against the shared signature set; objects are
//! malicious if any value is (keys are not scanned); arrays if any element
//! is. Other scalars never are. The walk carries an explicit depth counter
//! and stops descending past `max_depth`, so adversarially deep payloads cost
//! at most `max_depth` stack frames.

use axum::http::{header, HeaderMap, Method};
use serde_json::Value;

use crate::pipeline::patterns::{MaliciousPatternSet, PatternKind, MALICIOUS_PATTERNS};

/// Result of inspecting a raw body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Malicious(PatternKind),
    /// The body is not valid JSON; what happens next is a policy decision.
    Unparseable,
}

#[derive(Clone, Copy)]
pub struct PayloadInspector {
    max_depth: usize,
    patterns: &'static MaliciousPatternSet,
}

impl PayloadInspector {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            patterns: &MALICIOUS_PATTERNS,
        }
    }

    /// True if `value`, seen at nesting level `depth`, holds a malicious string.
    pub fn scan(&self, value: &Value, depth: usize) -> bool {
        self.find(value, depth).is_some()
    }

    /// Like [`scan`](Self::scan) but reports which signature matched first.
    pub fn find(&self, value: &Value, depth: usize) -> Option<PatternKind> {
        if depth > self.max_depth {
            return None;
        }
        match value {
            Value::String(text) => self.patterns.first_match(text),
            Value::Object(map) => map.values().find_map(|v| self.find(v, depth + 1)),
            Value::Array(items) => items.iter().find_map(|v| self.find(v, depth + 1)),
            Value::Null | Value::Bool(_) | Value::Number(_) => None,
        }
    }

    /// Parse `body` as JSON and scan it from the top level.
    pub fn inspect(&self, body: &[u8]) -> Verdict {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => match self.find(&value, 0) {
                Some(kind) => Verdict::Malicious(kind),
                None => Verdict::Clean,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Body is not valid JSON, skipping scan");
                Verdict::Unparseable
            }
        }
    }
}

/// Only body-carrying verbs with a JSON content type are inspected.
pub fn wants_inspection(method: &Method, headers: &HeaderMap) -> bool {
    let body_verb = matches!(*method, Method::POST | Method::PUT | Method::PATCH);
    body_verb && is_json(headers)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}
