//! Scripted CDP client for testing
//!
//! Responses are queued per method and handed out in order. `Input.*`
//! calls succeed with an empty result when nothing is queued; any other
//! unscripted call is a session error.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cdp::traits::CdpClient;
use crate::Error;

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, VecDeque<Result<Value, String>>>,
    calls: Vec<(String, Value)>,
}

/// Canned-response CDP client
#[derive(Debug, Default)]
pub struct ScriptedCdpClient {
    script: Mutex<Script>,
}

impl ScriptedCdpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a raw result for the next call to `method`
    pub fn respond(&self, method: &str, result: Value) -> &Self {
        self.script()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(result));
        self
    }

    /// Queue a protocol error for the next call to `method`
    pub fn fail(&self, method: &str, message: impl Into<String>) -> &Self {
        self.script()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Err(message.into()));
        self
    }

    /// Queue a `Runtime.evaluate` result returning `value` by value
    pub fn evaluate_to(&self, value: Value) -> &Self {
        self.respond(
            "Runtime.evaluate",
            json!({ "result": { "type": "object", "value": value } }),
        )
    }

    /// Queue a successful element-script result
    pub fn script_value(&self, value: Value) -> &Self {
        self.evaluate_to(json!({ "value": value }))
    }

    /// Queue an element-script result reporting a detached element
    pub fn script_stale(&self) -> &Self {
        self.evaluate_to(json!({ "stale": true }))
    }

    /// Queue a `Runtime.evaluate` result that threw
    pub fn script_exception(&self, description: &str) -> &Self {
        self.respond(
            "Runtime.evaluate",
            json!({
                "result": { "type": "object", "subtype": "error" },
                "exceptionDetails": {
                    "text": "Uncaught",
                    "lineNumber": 0,
                    "columnNumber": 0,
                    "exception": { "type": "object", "description": description }
                }
            }),
        )
    }

    /// Every call made, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.script().calls.clone()
    }

    /// Parameters of every call to `method`
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.script()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Expressions sent to `Runtime.evaluate`
    pub fn evaluated(&self) -> Vec<String> {
        self.calls_to("Runtime.evaluate")
            .iter()
            .filter_map(|p| p["expression"].as_str().map(str::to_string))
            .collect()
    }

    /// Number of responses still queued
    pub fn pending(&self) -> usize {
        self.script().responses.values().map(VecDeque::len).sum()
    }
}

#[async_trait]
impl CdpClient for ScriptedCdpClient {
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        let mut script = self.script();
        script.calls.push((method.to_string(), params));
        match script.responses.get_mut(method).and_then(VecDeque::pop_front) {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(Error::session(format!("{}: {}", method, message))),
            None if method.starts_with("Input.") => Ok(json!({})),
            None => Err(Error::session(format!("no scripted response for {}", method))),
        }
    }
}
