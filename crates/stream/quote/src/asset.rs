//! Destination asset discovery.
//!
//! The receiver declares its asset in probe replies. The first declaration
//! freezes the asset for the session; a different declaration later is a
//! conflict. A supplied asset takes precedence over declarations, which are
//! then only logged.

use sluice_primitives::{Amount, Asset};
use sluice_probe::{ProbeChannel, ProbeResult, Prober};
use tracing::{debug, warn};

use crate::{AssetBinding, PaymentError};

/// Tracks the destination asset binding for one session.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    binding: AssetBinding,
}

impl AssetResolver {
    pub fn new(binding: AssetBinding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> &AssetBinding {
        &self.binding
    }

    /// Apply the declarations of one reply.
    pub fn observe(&mut self, declarations: &[Asset]) -> Result<(), PaymentError> {
        for declared in declarations {
            self.apply(declared)?;
        }
        Ok(())
    }

    fn apply(&mut self, declared: &Asset) -> Result<(), PaymentError> {
        match &self.binding {
            AssetBinding::Unbound => {
                debug!(asset = %declared, "receiver declared asset");
                self.binding = AssetBinding::Declared(declared.clone());
            }
            AssetBinding::Supplied(supplied) if supplied != declared => {
                warn!(%supplied, %declared, "ignoring receiver asset declaration");
            }
            AssetBinding::Declared(frozen) if frozen != declared => {
                return Err(PaymentError::DestinationAssetConflict(format!(
                    "receiver declared {declared} after {frozen}"
                )));
            }
            AssetBinding::Supplied(_) | AssetBinding::Declared(_) => {}
        }
        Ok(())
    }

    /// Send the asset probe round and bind the destination asset.
    pub async fn resolve<C: ProbeChannel + ?Sized>(
        &mut self,
        prober: &mut Prober<'_, C>,
        amounts: Vec<Amount>,
    ) -> Result<Asset, PaymentError> {
        let results = prober.round(amounts).await;
        self.resolve_round(&results)
    }

    /// Bind the destination asset from the results of the asset probe round.
    pub fn resolve_round(&mut self, results: &[ProbeResult]) -> Result<Asset, PaymentError> {
        let mut declared: Vec<&Asset> = results
            .iter()
            .flat_map(|result| result.asset_declarations.iter())
            .collect();
        declared.dedup();
        if let [first, second, ..] = declared.as_slice() {
            if first != second {
                return Err(PaymentError::DestinationAssetConflict(format!(
                    "receiver declared both {first} and {second}"
                )));
            }
        }
        let declared = declared.into_iter().cloned().collect::<Vec<_>>();

        if results.iter().any(|result| result.closed_by_receiver) {
            return Err(PaymentError::EstablishmentFailed(
                "receiver closed the connection".to_string(),
            ));
        }

        self.observe(&declared)?;

        let replied = results.iter().any(|result| result.replied);
        match self.binding.asset() {
            Some(asset) => Ok(asset.clone()),
            None if replied => Err(PaymentError::UnknownDestinationAsset(
                "receiver did not declare an asset".to_string(),
            )),
            None => Err(PaymentError::EstablishmentFailed(
                "no reply to the asset probe".to_string(),
            )),
        }
    }
}
