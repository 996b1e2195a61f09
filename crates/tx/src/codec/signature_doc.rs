use kestrel_primitives::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{signer::SignatureV2, tx::Tx};

/// Signature-only document exchanged between cosigners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDocument {
    pub signatures: Vec<SignatureV2>,
}

impl SignatureDocument {
    pub fn from_tx(tx: &Tx) -> Result<Self> {
        Ok(Self {
            signatures: tx.signatures_v2()?,
        })
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::parse("signature document", e))
    }
}

/// Signatures from either a signature document or a full transaction document.
pub fn read_signatures(bytes: &[u8]) -> Result<Vec<SignatureV2>> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| Error::parse("signature document", e))?;
    if value.get("body").is_some() {
        let tx: Tx =
            serde_json::from_value(value).map_err(|e| Error::parse("transaction document", e))?;
        return tx.signatures_v2();
    }
    let doc: SignatureDocument =
        serde_json::from_value(value).map_err(|e| Error::parse("signature document", e))?;
    Ok(doc.signatures)
}
