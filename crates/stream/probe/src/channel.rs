use std::sync::Arc;

use async_trait::async_trait;
use sluice_primitives::Amount;

use crate::ProbeReply;

/// Transport-level probe failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// The path could not carry the packet.
    #[error("destination unreachable: {0}")]
    Unreachable(String),

    /// Channel was closed.
    #[error("probe channel closed")]
    Closed,

    /// Transport gave up waiting for a reply.
    #[error("probe timed out")]
    Timeout,
}

/// Sends unfulfillable test packets over an established STREAM connection.
///
/// Alternate behaviours (simulated paths, scripted replies, real transports)
/// are separate implementations.
#[async_trait]
pub trait ProbeChannel: Send + Sync {
    /// Send a probe of `amount` source units and wait for its reply.
    async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError>;

    /// Close the underlying connection.
    async fn close(&self) {}
}

#[async_trait]
impl<T: ProbeChannel + ?Sized> ProbeChannel for Arc<T> {
    async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
        (**self).send_probe(amount).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[async_trait]
impl<T: ProbeChannel + ?Sized> ProbeChannel for Box<T> {
    async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
        (**self).send_probe(amount).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
