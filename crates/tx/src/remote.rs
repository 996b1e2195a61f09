//! Chain-side collaborators reached over the network.

use async_trait::async_trait;
use kestrel_primitives::Result;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BroadcastMode {
    #[default]
    Sync,
    Async,
    Block,
}

impl BroadcastMode {
    /// `cosmos.tx.v1beta1.BroadcastMode` value.
    pub fn as_i32(self) -> i32 {
        match self {
            BroadcastMode::Block => 1,
            BroadcastMode::Sync => 2,
            BroadcastMode::Async => 3,
        }
    }

    pub fn as_proto_name(self) -> &'static str {
        match self {
            BroadcastMode::Block => "BROADCAST_MODE_BLOCK",
            BroadcastMode::Sync => "BROADCAST_MODE_SYNC",
            BroadcastMode::Async => "BROADCAST_MODE_ASYNC",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub height: i64,
    pub txhash: String,
    pub code: u32,
    pub raw_log: String,
}

/// Account lookup, simulation and broadcast against a Cosmos node.
///
/// Implementations do no retries; callers race every call against their cancellation token.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn account(&self, address: &str) -> Result<AccountInfo>;

    /// Gas used by the unsigned transaction bytes.
    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64>;

    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse>;
}
