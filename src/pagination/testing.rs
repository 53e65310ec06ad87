//! Scripted fetcher shared by the unit tests

use crate::error::{Error, Result};
use crate::http::Fetch;
use crate::types::{JsonValue, QueryParams};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned bodies and records every request made
#[derive(Debug, Default)]
pub(crate) struct ScriptedFetch {
    responses: Mutex<VecDeque<Result<JsonValue>>>,
    requests: Mutex<Vec<(String, QueryParams)>>,
}

impl ScriptedFetch {
    pub(crate) fn new(bodies: impl IntoIterator<Item = JsonValue>) -> Self {
        Self {
            responses: Mutex::new(bodies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn from_results(results: impl IntoIterator<Item = Result<JsonValue>>) -> Self {
        Self {
            responses: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push_error(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub(crate) fn requests(&self) -> Vec<(String, QueryParams)> {
        self.requests.lock().unwrap().clone()
    }

    /// Value of `name` in the n-th request
    pub(crate) fn param(&self, n: usize, name: &str) -> Option<String> {
        self.requests.lock().unwrap().get(n).and_then(|(_, query)| {
            query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, path: &str, query: &QueryParams) -> Result<JsonValue> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), query.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other(format!("no scripted response for {path}"))))
    }
}
