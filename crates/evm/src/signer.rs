use alloy_consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_primitives::{Address, Bytes, PrimitiveSignature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use kestrel_primitives::{CancellationToken, Error, PrivateKey, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    gas::{resolve_gas_limit, EvmOptions},
    msg::EvmMsg,
    recover::recover_signer,
    remote::EvmQuery,
};

/// A signed EIP-155 legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEvmTx {
    inner: Signed<TxLegacy>,
}

/// Node-style JSON rendering of a signed legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTxJson {
    #[serde(rename = "type", with = "alloy_serde::quantity")]
    pub tx_type: u8,
    #[serde(with = "alloy_serde::quantity")]
    pub chain_id: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub nonce: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_price: u128,
    #[serde(rename = "gas", with = "alloy_serde::quantity")]
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    #[serde(with = "alloy_serde::quantity")]
    pub v: u128,
    pub r: U256,
    pub s: U256,
    pub hash: B256,
}

impl SignedEvmTx {
    pub fn tx(&self) -> &TxLegacy {
        self.inner.tx()
    }

    pub fn signature(&self) -> &PrimitiveSignature {
        self.inner.signature()
    }

    pub fn hash(&self) -> B256 {
        *self.inner.hash()
    }

    /// RLP bytes as accepted by `eth_sendRawTransaction`.
    pub fn raw(&self) -> Vec<u8> {
        TxEnvelope::Legacy(self.inner.clone()).encoded_2718()
    }

    pub fn from_raw(mut raw: &[u8]) -> Result<Self> {
        match TxEnvelope::decode_2718(&mut raw).map_err(|e| Error::parse("evm transaction", e))? {
            TxEnvelope::Legacy(inner) => Ok(Self { inner }),
            other => Err(Error::InvalidRequest(format!(
                "expected a legacy evm transaction, got type {}",
                other.tx_type() as u8
            ))),
        }
    }

    /// Recover the sender, requiring the signature to commit to `chain_id`.
    pub fn recover_sender(&self, chain_id: u64) -> Result<Address> {
        let tx = self.tx();
        if tx.chain_id != Some(chain_id) {
            return Err(Error::SignatureInvalid(format!(
                "transaction is signed for chain {:?}, expected {chain_id}",
                tx.chain_id
            )));
        }
        recover_signer(self.signature(), tx.signature_hash()).ok_or_else(|| {
            Error::SignatureInvalid("cannot recover evm transaction sender".to_string())
        })
    }

    pub fn verify(&self, chain_id: u64, sender: Address) -> Result<()> {
        let recovered = self.recover_sender(chain_id)?;
        if recovered != sender {
            return Err(Error::SignatureMismatch(format!(
                "evm transaction signed by {recovered}, expected {sender}"
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> EvmTxJson {
        let tx = self.tx();
        let sig = self.signature();
        let chain_id = tx.chain_id.unwrap_or_default();
        EvmTxJson {
            tx_type: 0,
            chain_id,
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: tx.to.to().copied(),
            value: tx.value,
            input: tx.input.clone(),
            v: sig.v() as u128 + 35 + 2 * chain_id as u128,
            r: sig.r(),
            s: sig.s(),
            hash: self.hash(),
        }
    }
}

impl TryFrom<EvmTxJson> for SignedEvmTx {
    type Error = Error;

    fn try_from(json: EvmTxJson) -> Result<Self> {
        if json.tx_type != 0 {
            return Err(Error::InvalidRequest(format!(
                "expected a legacy evm transaction, got type {}",
                json.tx_type
            )));
        }
        let parity = json
            .v
            .checked_sub(35 + 2 * json.chain_id as u128)
            .filter(|p| *p <= 1)
            .ok_or_else(|| {
                Error::parse("evm transaction", format!("v {} does not match chain id", json.v))
            })?;

        let tx = TxLegacy {
            chain_id: Some(json.chain_id),
            nonce: json.nonce,
            gas_price: json.gas_price,
            gas_limit: json.gas_limit,
            to: json.to.into(),
            value: json.value,
            input: json.input,
        };
        let signed = Self {
            inner: tx.into_signed(PrimitiveSignature::new(json.r, json.s, parity == 1)),
        };
        if signed.hash() != json.hash {
            return Err(Error::parse(
                "evm transaction",
                format!("hash {} does not match its contents", json.hash),
            ));
        }
        Ok(signed)
    }
}

/// Sign `msg` as an EIP-155 legacy transaction with a resolved gas limit.
pub fn sign_evm_tx(
    msg: &EvmMsg,
    options: &EvmOptions,
    gas_limit: u64,
    key: &PrivateKey,
) -> Result<SignedEvmTx> {
    let signer = local_signer(key)?;
    let tx = TxLegacy {
        chain_id: Some(options.chain_id),
        nonce: options.nonce,
        gas_price: options.gas_price,
        gas_limit,
        to: msg.to(),
        value: msg.value(),
        input: msg.input(),
    };

    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .map_err(|e| Error::InvalidRequest(format!("failed to sign evm transaction: {e}")))?;
    let signed = SignedEvmTx {
        inner: tx.into_signed(signature),
    };
    debug!(hash = %signed.hash(), nonce = options.nonce, gas_limit, "Signed evm transaction");
    Ok(signed)
}

/// Resolve gas and sign in one step.
pub async fn create_and_sign(
    msg: &EvmMsg,
    options: &EvmOptions,
    key: &PrivateKey,
    query: Option<&dyn EvmQuery>,
    cancel: &CancellationToken,
) -> Result<SignedEvmTx> {
    let from = sender_address(key)?;
    let gas_limit = resolve_gas_limit(msg, options, from, query, cancel).await?;
    let signed = sign_evm_tx(msg, options, gas_limit, key)?;
    info!(
        kind = %msg.kind(),
        %from,
        chain_id = options.chain_id,
        hash = %signed.hash(),
        "Created evm transaction"
    );
    Ok(signed)
}

/// The Ethereum address controlled by `key`.
pub fn sender_address(key: &PrivateKey) -> Result<Address> {
    Ok(local_signer(key)?.address())
}

fn local_signer(key: &PrivateKey) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_slice(&key.secret_bytes()[..]).map_err(|e| Error::parse("private key", e))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes, TxKind};
    use kestrel_primitives::{ErrorKind, KeyAlgo};

    use super::*;

    fn key() -> PrivateKey {
        PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[3u8; 32]).unwrap()
    }

    fn transfer() -> EvmMsg {
        EvmMsg::SendCoin {
            to: address!("00000000000000000000000000000000000000bb"),
            amount: U256::from(1_000_000_000_000_000_000u128),
        }
    }

    #[test]
    fn sender_matches_ethermint_address() {
        let key = key();
        assert_eq!(
            sender_address(&key).unwrap().0 .0,
            key.public_key().address()
        );
    }

    #[test]
    fn signs_and_recovers() {
        let key = key();
        let signed = sign_evm_tx(&transfer(), &EvmOptions::new(47, 3), 21_000, &key).unwrap();
        assert_eq!(signed.tx().nonce, 3);
        assert_eq!(signed.tx().chain_id, Some(47));
        signed.verify(47, sender_address(&key).unwrap()).unwrap();

        let decoded = SignedEvmTx::from_raw(&signed.raw()).unwrap();
        assert_eq!(decoded, signed);
    }

    #[test]
    fn chain_id_isolation() {
        let key = key();
        let signed = sign_evm_tx(&transfer(), &EvmOptions::new(47, 0), 21_000, &key).unwrap();
        let err = signed.recover_sender(37).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureInvalid);

        let mut other = signed.tx().clone();
        other.chain_id = Some(37);
        assert_ne!(other.signature_hash(), signed.tx().signature_hash());
    }

    #[test]
    fn wrong_sender_is_a_mismatch() {
        let signed = sign_evm_tx(&transfer(), &EvmOptions::new(47, 0), 21_000, &key()).unwrap();
        let err = signed
            .verify(47, address!("00000000000000000000000000000000000000aa"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
    }

    #[test]
    fn deploy_has_no_recipient() {
        let msg = EvmMsg::DeployContract {
            bytecode: bytes!("6080604052348015600f57600080fd5b50"),
            value: U256::ZERO,
        };
        let signed = sign_evm_tx(&msg, &EvmOptions::new(47, 0), 120_000, &key()).unwrap();
        assert_eq!(signed.tx().to, TxKind::Create);
        assert!(signed.to_json().to.is_none());
    }

    #[test]
    fn json_rendering() {
        let signed = sign_evm_tx(&transfer(), &EvmOptions::new(47, 1), 21_000, &key()).unwrap();
        let json = serde_json::to_value(signed.to_json()).unwrap();
        assert_eq!(json["type"], "0x0");
        assert_eq!(json["chainId"], "0x2f");
        assert_eq!(json["nonce"], "0x1");
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["value"], "0xde0b6b3a7640000");
        let v = json["v"].as_str().unwrap();
        assert!(v == "0x81" || v == "0x82", "unexpected v {v}");

        let back: EvmTxJson = serde_json::from_value(json).unwrap();
        assert_eq!(SignedEvmTx::try_from(back).unwrap(), signed);
    }

    #[test]
    fn tampered_json_is_rejected() {
        let signed = sign_evm_tx(&transfer(), &EvmOptions::new(47, 1), 21_000, &key()).unwrap();
        let mut json = signed.to_json();
        json.nonce += 1;
        assert_eq!(SignedEvmTx::try_from(json).unwrap_err().kind(), ErrorKind::Parse);
    }
}
