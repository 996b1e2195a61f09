use std::path::PathBuf;

use alloy_primitives::B256;
use kestrel_evm::{EvmMsg, SignedEvmTx};
use kestrel_primitives::{Error, Result};
use kestrel_tx::{codec::SignatureDocument, CosmosMsg, Tx, TxResponse};
use serde_json::Value;

/// What to build. Picked once; the two pipelines never share fee or gas logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxRequest {
    Structured(Vec<CosmosMsg>),
    RawEvm(EvmMsg),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignedTx {
    Structured(Tx),
    RawEvm(SignedEvmTx),
}

impl SignedTx {
    /// Bytes the matching broadcast endpoint accepts.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            SignedTx::Structured(tx) => tx.to_bytes(),
            SignedTx::RawEvm(tx) => Ok(tx.raw()),
        }
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        match self {
            SignedTx::Structured(tx) => tx.to_json_pretty(),
            SignedTx::RawEvm(tx) => serde_json::to_vec_pretty(&tx.to_json())
                .map_err(|e| Error::parse("evm transaction", e)),
        }
    }
}

/// The document a sign or multisign call produces.
#[derive(Clone, Debug, PartialEq)]
pub enum SignedDocument {
    Tx(Tx),
    Signatures(SignatureDocument),
    /// Legacy amino broadcast request.
    Amino(Value),
}

impl SignedDocument {
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        match self {
            SignedDocument::Tx(tx) => tx.to_json_pretty(),
            SignedDocument::Signatures(doc) => doc.to_json_pretty(),
            SignedDocument::Amino(value) => serde_json::to_vec_pretty(value)
                .map_err(|e| Error::parse("amino broadcast request", e)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastResult {
    Cosmos(TxResponse),
    Evm(B256),
}

/// Sign a stored unsigned transaction with the configured key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignTxMsg {
    pub unsigned_file: PathBuf,
    pub signature_only: bool,
    /// Cosign on behalf of this multisig; implies amino-json and signature-only output.
    pub multisig_address: Option<String>,
    /// When set, must match the configured key.
    pub from_address: Option<String>,
    pub overwrite: bool,
    pub amino: bool,
    pub offline: bool,
}

/// Aggregate cosigner signature documents for a keyring multisig.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxMultiSignMsg {
    pub file: PathBuf,
    pub from_name: String,
    pub signature_files: Vec<PathBuf>,
    pub offline: bool,
    pub signature_only: bool,
    pub amino: bool,
    pub output_document: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidateSignaturesMsg {
    pub file: PathBuf,
    /// Falls back to the configured chain id.
    pub chain_id: Option<String>,
    pub offline: bool,
}
