use alloy_primitives::{TxKind, B256};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_transport::BoxTransport;
use async_trait::async_trait;
use kestrel_evm::{EstimateRequest, EvmQuery};
use kestrel_primitives::{Error, Result};
use tracing::debug;
use url::Url;

/// EVM JSON-RPC endpoint.
pub struct EvmRpcClient {
    provider: RootProvider<BoxTransport>,
}

impl EvmRpcClient {
    pub async fn connect(url: &Url) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .on_builtin(url.as_str())
            .await
            .map_err(|e| Error::remote(format!("evm rpc {url}"), e))?;
        Ok(Self { provider })
    }
}

fn transaction_request(request: EstimateRequest) -> TransactionRequest {
    TransactionRequest {
        from: Some(request.from),
        to: Some(request.to.map_or(TxKind::Create, TxKind::Call)),
        value: Some(request.value),
        input: TransactionInput::new(request.input),
        ..Default::default()
    }
}

#[async_trait]
impl EvmQuery for EvmRpcClient {
    async fn estimate_gas(&self, request: EstimateRequest) -> Result<u64> {
        let tx = transaction_request(request);
        let gas = self
            .provider
            .estimate_gas(&tx)
            .await
            .map_err(|e| Error::remote("eth_estimateGas", e))?;
        debug!(gas, "Estimated gas");
        Ok(gas)
    }

    async fn send_raw_transaction(&self, raw: Vec<u8>) -> Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| Error::remote("eth_sendRawTransaction", e))?;
        Ok(*pending.tx_hash())
    }
}
