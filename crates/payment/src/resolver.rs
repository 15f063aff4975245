//! Destination resolution boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_quote::{PaymentError, StreamCredentials};

use crate::ResolveTarget;

/// Resolution failure reported by a [`DestinationResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Endpoint could not be queried or answered with an error.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Endpoint answered with unusable credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Invoice is already paid.
    #[error("invoice already paid: {0}")]
    InvoiceAlreadyPaid(String),
}

impl From<ResolveError> for PaymentError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::QueryFailed(reason) => Self::QueryFailed(reason),
            ResolveError::InvalidCredentials(reason) => Self::InvalidCredentials(reason),
            ResolveError::InvoiceAlreadyPaid(reason) => Self::InvoiceAlreadyPaid(reason),
        }
    }
}

/// Fetches STREAM credentials for an SPSP or Open Payments endpoint.
#[async_trait]
pub trait DestinationResolver: Send + Sync {
    async fn resolve(&self, target: &ResolveTarget) -> Result<StreamCredentials, ResolveError>;
}

/// Resolver backed by a fixed table of endpoints.
#[derive(Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<ResolveTarget, Result<StreamCredentials, ResolveError>>,
    queries: Mutex<Vec<ResolveTarget>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: ResolveTarget, credentials: StreamCredentials) -> Self {
        self.entries.insert(target, Ok(credentials));
        self
    }

    pub fn with_error(mut self, target: ResolveTarget, error: ResolveError) -> Self {
        self.entries.insert(target, Err(error));
        self
    }

    /// Targets queried so far, in order.
    pub fn queries(&self) -> Vec<ResolveTarget> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl DestinationResolver for StaticResolver {
    async fn resolve(&self, target: &ResolveTarget) -> Result<StreamCredentials, ResolveError> {
        self.queries.lock().push(target.clone());
        self.entries
            .get(target)
            .cloned()
            .unwrap_or_else(|| Err(ResolveError::QueryFailed(format!("{target} not found"))))
    }
}

#[async_trait]
impl<'a, T: DestinationResolver + ?Sized> DestinationResolver for &'a T {
    async fn resolve(&self, target: &ResolveTarget) -> Result<StreamCredentials, ResolveError> {
        (**self).resolve(target).await
    }
}
