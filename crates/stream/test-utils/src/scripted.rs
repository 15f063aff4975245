use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_primitives::Amount;
use sluice_probe::{ProbeChannel, ProbeError, ProbeReply};

/// Replies from a fixed table; amounts not in the table get the fallback.
#[derive(Debug)]
pub struct ScriptedChannel {
    replies: HashMap<Amount, Result<ProbeReply, ProbeError>>,
    fallback: Result<ProbeReply, ProbeError>,
    sent: Mutex<Vec<Amount>>,
}

impl ScriptedChannel {
    pub fn new(fallback: Result<ProbeReply, ProbeError>) -> Self {
        Self {
            replies: HashMap::new(),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, amount: Amount, reply: Result<ProbeReply, ProbeError>) -> Self {
        self.replies.insert(amount, reply);
        self
    }

    pub fn sent_amounts(&self) -> Vec<Amount> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ProbeChannel for ScriptedChannel {
    async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
        self.sent.lock().push(amount);
        self.replies.get(&amount).unwrap_or(&self.fallback).clone()
    }
}

/// Never replies. Pair with paused tokio time to exercise timeouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledChannel;

#[async_trait]
impl ProbeChannel for StalledChannel {
    async fn send_probe(&self, _amount: Amount) -> Result<ProbeReply, ProbeError> {
        std::future::pending().await
    }
}
