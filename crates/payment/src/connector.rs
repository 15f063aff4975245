//! Opening probe channels.

use std::sync::Arc;

use async_trait::async_trait;
use sluice_probe::ProbeChannel;
use sluice_quote::Destination;

/// Failure to establish a STREAM connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("connect failed: {0}")]
pub struct ConnectError(pub String);

/// Opens a [`ProbeChannel`] to a destination.
#[async_trait]
pub trait ProbeConnector: Send + Sync {
    type Channel: ProbeChannel;

    async fn connect(&self, destination: &Destination) -> Result<Self::Channel, ConnectError>;
}

/// Hands out a shared, pre-built channel for every destination.
#[derive(Debug)]
pub struct StaticConnector<C: ?Sized> {
    channel: Arc<C>,
}

impl<C: ?Sized> StaticConnector<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }
}

impl<C: ?Sized> Clone for StaticConnector<C> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
        }
    }
}

#[async_trait]
impl<C: ProbeChannel + ?Sized + 'static> ProbeConnector for StaticConnector<C> {
    type Channel = Arc<C>;

    async fn connect(&self, _destination: &Destination) -> Result<Self::Channel, ConnectError> {
        Ok(Arc::clone(&self.channel))
    }
}

#[async_trait]
impl<'a, T: ProbeConnector + ?Sized> ProbeConnector for &'a T {
    type Channel = T::Channel;

    async fn connect(&self, destination: &Destination) -> Result<Self::Channel, ConnectError> {
        (**self).connect(destination).await
    }
}
