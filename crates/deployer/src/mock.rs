// Scripted in-memory provider for testing

use async_trait::async_trait;
use serde_json::{Value, json};
use sitedrop_core::{CreateDeployment, ProviderResponse};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{HostingProvider, ProviderError};

/// A call received by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Create {
        token: String,
        payload: CreateDeployment,
    },
    Get {
        token: String,
        id: String,
    },
}

/// Provider that replays scripted responses and records every call.
///
/// Creation calls without a scripted response fail. Status polls without one
/// report a deployment that has no URL yet.
#[derive(Debug)]
pub struct MockProvider {
    domain: String,
    creates: Mutex<VecDeque<Result<Value, ProviderError>>>,
    polls: Mutex<VecDeque<Result<Value, ProviderError>>>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            domain: "vercel.app".to_string(),
            creates: Mutex::new(VecDeque::new()),
            polls: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response to the next creation call.
    #[must_use]
    pub fn on_create(mut self, response: Result<Value, ProviderError>) -> Self {
        if let Ok(queue) = self.creates.get_mut() {
            queue.push_back(response);
        }
        self
    }

    /// Queue the response to the next status poll.
    #[must_use]
    pub fn on_poll(mut self, response: Result<Value, ProviderError>) -> Self {
        if let Ok(queue) = self.polls.get_mut() {
            queue.push_back(response);
        }
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ProviderCall) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .map_err(|_| ProviderError::Transport("lock poisoned".to_string()))?
            .push(call);
        Ok(())
    }
}

#[async_trait]
impl HostingProvider for MockProvider {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn create_deployment(
        &self,
        token: &str,
        payload: &CreateDeployment,
    ) -> Result<ProviderResponse, ProviderError> {
        self.record(ProviderCall::Create {
            token: token.to_string(),
            payload: payload.clone(),
        })?;

        self.creates
            .lock()
            .map_err(|_| ProviderError::Transport("lock poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("no scripted response".to_string())))
            .map(ProviderResponse::new)
    }

    async fn get_deployment(&self, token: &str, id: &str) -> Result<ProviderResponse, ProviderError> {
        self.record(ProviderCall::Get {
            token: token.to_string(),
            id: id.to_string(),
        })?;

        self.polls
            .lock()
            .map_err(|_| ProviderError::Transport("lock poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "id": id, "readyState": "BUILDING" })))
            .map(ProviderResponse::new)
    }
}
