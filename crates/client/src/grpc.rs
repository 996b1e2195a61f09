use async_trait::async_trait;
use cosmrs::proto::{
    cosmos::{
        auth::v1beta1::{
            query_client::QueryClient, BaseAccount, ModuleAccount, QueryAccountRequest,
        },
        tx::v1beta1::{service_client::ServiceClient, BroadcastTxRequest, SimulateRequest},
    },
    prost::Message,
};
use tonic::transport::Channel;
use kestrel_primitives::{Error, Result};
use kestrel_tx::{AccountInfo, BroadcastMode, ChainQuery, TxResponse};
use tracing::debug;
use url::Url;

const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";
const ETH_ACCOUNT_TYPE_URL: &str = "/ethermint.types.v1.EthAccount";

/// Cosmos gRPC endpoint. A fresh channel is opened per call.
pub struct GrpcClient {
    url: String,
}

impl GrpcClient {
    pub fn new(url: &Url) -> Self {
        Self {
            url: url.as_str().trim_end_matches('/').to_string(),
        }
    }

    async fn service(&self, what: &str) -> Result<ServiceClient<Channel>> {
        ServiceClient::connect(self.url.clone())
            .await
            .map_err(|e| Error::remote(what, e))
    }
}

/// Account number and sequence from an `auth` query result.
fn account_info(type_url: &str, value: &[u8]) -> Result<AccountInfo> {
    let base = match type_url {
        BASE_ACCOUNT_TYPE_URL => {
            BaseAccount::decode(value).map_err(|e| Error::remote("account", e))?
        }
        // EthAccount{base_account = 1, code_hash = 2} shares ModuleAccount's leading fields
        ETH_ACCOUNT_TYPE_URL => ModuleAccount::decode(value)
            .map_err(|e| Error::remote("account", e))?
            .base_account
            .ok_or_else(|| Error::remote("account", "eth account without base account"))?,
        other => {
            return Err(Error::remote(
                "account",
                format!("unsupported account type {other}"),
            ))
        }
    };
    Ok(AccountInfo {
        account_number: base.account_number,
        sequence: base.sequence,
    })
}

#[async_trait]
impl ChainQuery for GrpcClient {
    async fn account(&self, address: &str) -> Result<AccountInfo> {
        debug!(address, "Querying account over grpc");
        let mut client = QueryClient::connect(self.url.clone())
            .await
            .map_err(|e| Error::remote("account", e))?;
        let response = client
            .account(QueryAccountRequest {
                address: address.to_string(),
            })
            .await
            .map_err(|e| Error::remote("account", e))?
            .into_inner();
        let any = response
            .account
            .ok_or_else(|| Error::remote("account", format!("{address} not found")))?;
        account_info(&any.type_url, &any.value)
    }

    #[allow(deprecated)]
    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64> {
        let response = self
            .service("simulate")
            .await?
            .simulate(SimulateRequest { tx: None, tx_bytes })
            .await
            .map_err(|e| Error::remote("simulate", e))?
            .into_inner();
        response
            .gas_info
            .map(|info| info.gas_used)
            .ok_or_else(|| Error::remote("simulate", "response has no gas info"))
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse> {
        let response = self
            .service("broadcast")
            .await?
            .broadcast_tx(BroadcastTxRequest {
                tx_bytes,
                mode: mode.as_i32(),
            })
            .await
            .map_err(|e| Error::remote("broadcast", e))?
            .into_inner();
        let tx = response
            .tx_response
            .ok_or_else(|| Error::remote("broadcast", "response has no tx_response"))?;
        Ok(TxResponse {
            height: tx.height,
            txhash: tx.txhash,
            code: tx.code,
            raw_log: tx.raw_log,
        })
    }
}
