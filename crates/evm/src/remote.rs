use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use async_trait::async_trait;
use kestrel_primitives::Result;
use serde::{Deserialize, Serialize};

/// Call parameters for `eth_estimateGas`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

impl EstimateRequest {
    pub fn new(from: Address, to: TxKind, value: U256, input: Bytes) -> Self {
        Self {
            from,
            to: to.to().copied(),
            value,
            input,
        }
    }
}

/// The JSON-RPC surface the EVM signer needs from a node.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EvmQuery: Send + Sync {
    async fn estimate_gas(&self, request: EstimateRequest) -> Result<u64>;

    async fn send_raw_transaction(&self, raw: Vec<u8>) -> Result<B256>;
}
