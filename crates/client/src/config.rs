use std::path::Path;

use kestrel_primitives::{
    consts::{DEFAULT_ACCOUNT_PREFIX, DEFAULT_DENOM},
    fs::read_document,
    Error, KeyAlgo, Result,
};
use kestrel_tx::BroadcastMode;
use serde::{Deserialize, Serialize};
use url::Url;

/// Endpoints and chain parameters shared by every call of a [`crate::TxClient`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub chain_id: String,
    pub lcd_url: Option<Url>,
    pub grpc_url: Option<Url>,
    pub evm_rpc_url: Option<Url>,
    pub broadcast_mode: BroadcastMode,
    pub account_prefix: String,
    pub denom: String,
    pub key_algo: KeyAlgo,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: String::new(),
            lcd_url: None,
            grpc_url: None,
            evm_rpc_url: None,
            broadcast_mode: BroadcastMode::default(),
            account_prefix: DEFAULT_ACCOUNT_PREFIX.to_string(),
            denom: DEFAULT_DENOM.to_string(),
            key_algo: KeyAlgo::default(),
        }
    }
}

/// Which Cosmos transport the config selects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Grpc(Url),
    Lcd(Url),
    Offline,
}

impl ClientConfig {
    /// Load a YAML or JSON config, chosen by file extension (YAML otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_document(path)?;
        let what = format!("config {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_slice(&bytes).map_err(|e| Error::parse(what, e)),
            _ => serde_yaml::from_slice(&bytes).map_err(|e| Error::parse(what, e)),
        }
    }

    /// gRPC wins over LCD; neither means offline.
    pub fn endpoint(&self) -> Endpoint {
        match (&self.grpc_url, &self.lcd_url) {
            (Some(grpc), _) => Endpoint::Grpc(grpc.clone()),
            (None, Some(lcd)) => Endpoint::Lcd(lcd.clone()),
            (None, None) => Endpoint::Offline,
        }
    }
}
