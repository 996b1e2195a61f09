use alloy_primitives::Address;
use kestrel_primitives::{
    cancellable,
    consts::{DEFAULT_EVM_GAS_LIMIT, DEFAULT_GAS_PRICE},
    numeric::{parse_amount, GasAdjustment},
    CancellationToken, Error, Result,
};
use tracing::debug;

use crate::{
    msg::EvmMsg,
    remote::{EstimateRequest, EvmQuery},
};

/// Inputs for one raw EVM transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvmOptions {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: Option<u64>,
    pub gas_price: u128,
    pub gas_adjustment: GasAdjustment,
}

impl EvmOptions {
    pub fn new(chain_id: u64, nonce: u64) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit: None,
            gas_price: 850_000_000_000,
            gas_adjustment: GasAdjustment::default(),
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_gas_adjustment(mut self, adjustment: GasAdjustment) -> Self {
        self.gas_adjustment = adjustment;
        self
    }
}

/// Parse a gas price string into wei; an empty string falls back to the default price.
pub fn parse_gas_price(gas_price: &str) -> Result<u128> {
    let gas_price = if gas_price.trim().is_empty() { DEFAULT_GAS_PRICE } else { gas_price };
    let price = parse_amount("gas price", gas_price)?;
    u128::try_from(price).map_err(|e| Error::parse("gas price", e))
}

/// Resolve the gas limit for `msg`.
///
/// An explicit limit always wins. A value transfer otherwise uses the fixed transfer cost
/// scaled by the adjustment. Contract calls and deployments need `eth_estimateGas`, scaled
/// by the adjustment, and fail without a node.
pub async fn resolve_gas_limit(
    msg: &EvmMsg,
    options: &EvmOptions,
    from: Address,
    query: Option<&dyn EvmQuery>,
    cancel: &CancellationToken,
) -> Result<u64> {
    if let Some(gas_limit) = options.gas_limit {
        return Ok(gas_limit);
    }

    if let EvmMsg::SendCoin { .. } = msg {
        return options.gas_adjustment.apply(DEFAULT_EVM_GAS_LIMIT);
    }

    let query = query.ok_or_else(|| {
        Error::InsufficientParams(format!(
            "{} needs a gas limit or an EVM endpoint to estimate one",
            msg.kind()
        ))
    })?;
    let request = EstimateRequest::new(from, msg.to(), msg.value(), msg.input());
    let estimated = cancellable(cancel, query.estimate_gas(request)).await?;
    let gas_limit = options.gas_adjustment.apply(estimated)?;
    debug!(kind = %msg.kind(), estimated, gas_limit, "Estimated EVM gas");
    Ok(gas_limit)
}
