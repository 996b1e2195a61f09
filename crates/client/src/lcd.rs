use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use kestrel_primitives::{Error, Result};
use kestrel_tx::{AccountInfo, BroadcastMode, ChainQuery, TxResponse};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use serde_with::{serde_as, DisplayFromStr};
use tracing::debug;
use url::Url;

/// Cosmos REST (LCD) endpoint.
pub struct LcdClient {
    base: Url,
    client: reqwest::Client,
}

#[serde_as]
#[derive(Deserialize)]
struct GasInfo {
    #[serde_as(as = "DisplayFromStr")]
    gas_used: u64,
}

#[derive(Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[serde_as]
#[derive(Deserialize)]
struct LcdTxResponse {
    #[serde_as(as = "DisplayFromStr")]
    height: i64,
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: LcdTxResponse,
}

#[serde_as]
#[derive(Deserialize)]
struct BaseAccount {
    #[serde_as(as = "DisplayFromStr")]
    account_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    sequence: u64,
}

impl LcdClient {
    pub fn new(mut base: Url) -> Self {
        // `Url::join` replaces the last segment unless the path ends in `/`
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::parse(format!("lcd url {path}"), e))
    }

    async fn read<T: DeserializeOwned>(what: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await.map_err(|e| Error::remote(what, e))?;
        if !status.is_success() {
            return Err(Error::remote(what, format!("{status} - {text}")));
        }
        serde_json::from_str(&text).map_err(|e| Error::remote(what, e))
    }
}

/// `BaseAccount` or an Ethermint `EthAccount` wrapping one.
fn account_info(account: &Value) -> Result<AccountInfo> {
    let base = account.get("base_account").unwrap_or(account);
    let base: BaseAccount =
        serde_json::from_value(base.clone()).map_err(|e| Error::remote("account", e))?;
    Ok(AccountInfo {
        account_number: base.account_number,
        sequence: base.sequence,
    })
}

#[async_trait]
impl ChainQuery for LcdClient {
    async fn account(&self, address: &str) -> Result<AccountInfo> {
        let url = self.url(&format!("cosmos/auth/v1beta1/accounts/{address}"))?;
        debug!(%url, "Querying account");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::remote("account", e))?;
        let body: Value = Self::read("account", response).await?;
        let account = body
            .get("account")
            .ok_or_else(|| Error::remote("account", "response has no account"))?;
        account_info(account)
    }

    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64> {
        let url = self.url("cosmos/tx/v1beta1/simulate")?;
        let body = json!({ "tx_bytes": STANDARD.encode(tx_bytes) });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::remote("simulate", e))?;
        let simulated: SimulateResponse = Self::read("simulate", response).await?;
        Ok(simulated.gas_info.gas_used)
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse> {
        let url = self.url("cosmos/tx/v1beta1/txs")?;
        let body = json!({
            "tx_bytes": STANDARD.encode(tx_bytes),
            "mode": mode.as_proto_name(),
        });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::remote("broadcast", e))?;
        let broadcast: BroadcastResponse = Self::read("broadcast", response).await?;
        let tx = broadcast.tx_response;
        Ok(TxResponse {
            height: tx.height,
            txhash: tx.txhash,
            code: tx.code,
            raw_log: tx.raw_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::ErrorKind;

    use super::*;

    #[test]
    fn base_and_eth_accounts() {
        let base = json!({
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "xpla1...",
            "account_number": "12",
            "sequence": "3",
        });
        assert_eq!(
            account_info(&base).unwrap(),
            AccountInfo {
                account_number: 12,
                sequence: 3
            }
        );

        let eth = json!({
            "@type": "/ethermint.types.v1.EthAccount",
            "base_account": {"account_number": "7", "sequence": "0"},
            "code_hash": "0xc5d2",
        });
        assert_eq!(account_info(&eth).unwrap().account_number, 7);
    }

    #[test]
    fn malformed_account_is_remote_error() {
        let err = account_info(&json!({"account_number": "x"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRequest);
    }

    #[test]
    fn joins_paths_under_base() {
        let lcd = LcdClient::new("http://localhost:1317/".parse().unwrap());
        assert_eq!(
            lcd.url("cosmos/tx/v1beta1/simulate").unwrap().as_str(),
            "http://localhost:1317/cosmos/tx/v1beta1/simulate"
        );
    }
}
