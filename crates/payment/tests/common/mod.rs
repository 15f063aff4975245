#![allow(dead_code, unreachable_pub)]

use std::sync::Arc;

use sluice_payment::{PaymentSession, PaymentTarget, StaticConnector, StaticResolver, setup_payment};
use sluice_primitives::Asset;
use sluice_quote::{DefaultQuoteConfig, Invoice, PaymentError, StreamCredentials};
use sluice_test_utils::SimulatedPath;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn usd() -> Asset {
    Asset::new("USD", 9)
}

pub fn credentials() -> StreamCredentials {
    StreamCredentials {
        destination_address: "test.receiver.bob".to_string(),
        shared_secret: vec![0x5a; 32],
        destination_asset: None,
        invoice: None,
    }
}

pub fn invoice_credentials(to_deliver: u64, delivered: u64) -> StreamCredentials {
    StreamCredentials {
        invoice: Some(Invoice::new(to_deliver.into(), delivered.into())),
        ..credentials()
    }
}

/// Open a session over `path` using raw credentials.
pub async fn session(
    path: &Arc<SimulatedPath>,
    credentials: StreamCredentials,
) -> Result<PaymentSession<Arc<SimulatedPath>, DefaultQuoteConfig>, PaymentError> {
    setup_payment(
        StaticResolver::new(),
        StaticConnector::new(Arc::clone(path)),
        PaymentTarget::Credentials(credentials),
    )
    .await
}
