//! Signing engine.
//!
//! Signing runs in two passes over a draft. Pass 1 attaches a signer slot (public key, sign
//! mode, sequence) with an empty signature for every signer; only then are the sign bytes
//! defined, since direct mode covers the auth info. Pass 2 signs those bytes per signer and
//! fills the matching slot.

use cosmrs::proto::{cosmos::crypto::multisig::v1beta1::MultiSignature, prost::Message};
use kestrel_primitives::{Error, PrivateKey, Result};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, DisplayFromStr};
use tracing::{debug, trace};

use crate::{
    bitarray::CompactBitArray,
    pubkey::TxPublicKey,
    sign_mode::{sign_bytes, SignMode, SignerData},
    tx::{ModeInfo, SignerInfo, Tx},
};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureData {
    Single {
        mode: SignMode,
        #[serde_as(as = "Base64")]
        signature: Vec<u8>,
    },
    Multi {
        bitarray: CompactBitArray,
        signatures: Vec<SignatureData>,
    },
}

impl SignatureData {
    pub fn mode_info(&self) -> ModeInfo {
        match self {
            SignatureData::Single { mode, .. } => ModeInfo::single(*mode),
            SignatureData::Multi {
                bitarray,
                signatures,
            } => ModeInfo::Multi {
                bitarray: bitarray.clone(),
                mode_infos: signatures.iter().map(SignatureData::mode_info).collect(),
            },
        }
    }

    /// Bytes stored in `Tx.signatures`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            SignatureData::Single { signature, .. } => signature.clone(),
            SignatureData::Multi { signatures, .. } => MultiSignature {
                signatures: signatures.iter().map(SignatureData::to_bytes).collect(),
            }
            .encode_to_vec(),
        }
    }

    pub fn from_parts(mode_info: &ModeInfo, bytes: &[u8]) -> Result<Self> {
        match mode_info {
            ModeInfo::Single { mode } => Ok(SignatureData::Single {
                mode: *mode,
                signature: bytes.to_vec(),
            }),
            ModeInfo::Multi {
                bitarray,
                mode_infos,
            } => {
                let multi =
                    MultiSignature::decode(bytes).map_err(|e| Error::parse("multi signature", e))?;
                if multi.signatures.len() != mode_infos.len() {
                    return Err(Error::parse(
                        "multi signature",
                        format!(
                            "{} signatures for {} mode infos",
                            multi.signatures.len(),
                            mode_infos.len()
                        ),
                    ));
                }
                let signatures = mode_infos
                    .iter()
                    .zip(&multi.signatures)
                    .map(|(info, sig)| SignatureData::from_parts(info, sig))
                    .collect::<Result<_>>()?;
                Ok(SignatureData::Multi {
                    bitarray: bitarray.clone(),
                    signatures,
                })
            }
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SignatureData::Single { signature, .. } => signature.is_empty(),
            SignatureData::Multi { signatures, .. } => signatures.is_empty(),
        }
    }
}

/// A public key, its signature data and the sequence it was produced for.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureV2 {
    pub public_key: TxPublicKey,
    pub data: SignatureData,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
}

impl SignatureV2 {
    fn placeholder(public_key: TxPublicKey, mode: SignMode, sequence: u64) -> Self {
        Self {
            public_key,
            data: SignatureData::Single {
                mode,
                signature: vec![],
            },
            sequence,
        }
    }
}

impl Tx {
    /// Replace all signer slots and signatures.
    pub fn set_signatures(&mut self, signatures: Vec<SignatureV2>) {
        self.auth_info.signer_infos.clear();
        self.signatures.clear();
        for sig in signatures {
            self.push_signature(sig);
        }
    }

    fn push_signature(&mut self, sig: SignatureV2) {
        self.auth_info.signer_infos.push(SignerInfo {
            public_key: Some(sig.public_key),
            mode_info: sig.data.mode_info(),
            sequence: sig.sequence,
        });
        self.signatures.push(sig.data.to_bytes());
    }

    /// Signer slots paired with their signature bytes.
    pub fn signatures_v2(&self) -> Result<Vec<SignatureV2>> {
        if self.signatures.len() != self.auth_info.signer_infos.len() {
            return Err(Error::SignatureMismatch(format!(
                "{} signatures for {} signer infos",
                self.signatures.len(),
                self.auth_info.signer_infos.len()
            )));
        }
        self.auth_info
            .signer_infos
            .iter()
            .zip(&self.signatures)
            .map(|(info, bytes)| {
                let public_key = info
                    .public_key
                    .clone()
                    .ok_or_else(|| Error::parse("signer info", "missing public key"))?;
                Ok(SignatureV2 {
                    public_key,
                    data: SignatureData::from_parts(&info.mode_info, bytes)?,
                    sequence: info.sequence,
                })
            })
            .collect()
    }
}

pub struct SignerKey<'a> {
    pub key: &'a PrivateKey,
    pub data: SignerData,
}

/// Run both passes for `signers`, returning their signatures in declaration order.
///
/// With `overwrite` the existing slots are dropped; otherwise new slots are appended after them
/// and a key that already holds a slot is rejected.
pub fn sign_round(
    tx: &mut Tx,
    signers: &[SignerKey<'_>],
    mode: SignMode,
    overwrite: bool,
) -> Result<Vec<SignatureV2>> {
    if signers.is_empty() {
        return Err(Error::InsufficientParams("no signing key".into()));
    }

    let mut slots = if overwrite { vec![] } else { tx.signatures_v2()? };
    for signer in signers {
        let public_key = TxPublicKey::from(signer.key.public_key());
        if slots.iter().any(|slot| slot.public_key == public_key) {
            return Err(Error::InvalidRequest(format!(
                "{} already signed the transaction; sign with overwrite to replace it",
                hex_address(&public_key)
            )));
        }
        slots.push(SignatureV2::placeholder(
            signer.key.public_key().into(),
            mode,
            signer.data.sequence,
        ));
    }
    tx.set_signatures(slots);
    debug!(signers = signers.len(), %mode, "Attached signer slots");

    signers
        .iter()
        .map(|signer| sign_slot(tx, signer, mode))
        .collect()
}

/// Pass 2 for one signer: fill the empty slot that pass 1 attached for its key.
pub fn sign_slot(tx: &mut Tx, signer: &SignerKey<'_>, mode: SignMode) -> Result<SignatureV2> {
    if tx.signatures.len() != tx.auth_info.signer_infos.len() {
        return Err(Error::SignatureMismatch(format!(
            "{} signatures for {} signer infos",
            tx.signatures.len(),
            tx.auth_info.signer_infos.len()
        )));
    }
    let public_key = TxPublicKey::from(signer.key.public_key());
    let index = tx
        .auth_info
        .signer_infos
        .iter()
        .zip(&tx.signatures)
        .position(|(info, signature)| {
            info.public_key.as_ref() == Some(&public_key)
                && info.mode_info == ModeInfo::single(mode)
                && signature.is_empty()
        })
        .ok_or_else(|| {
            Error::InvalidRequest(format!(
                "no empty {mode} signer slot for {}",
                hex_address(&public_key)
            ))
        })?;

    let bytes = sign_bytes(mode, tx, &signer.data)?;
    let signature = signer.key.sign(&bytes);
    trace!(index, payload_len = bytes.len(), "Signed slot");

    let slot = tx
        .signatures
        .get_mut(index)
        .ok_or_else(|| Error::InvalidRequest(format!("signer slot {index} is missing")))?;
    *slot = signature.clone();
    let sig = SignatureV2 {
        public_key,
        data: SignatureData::Single { mode, signature },
        sequence: signer.data.sequence,
    };
    Ok(sig)
}

/// Whether every slot carries a signature.
pub fn is_fully_signed(sigs: &[SignatureV2]) -> bool {
    !sigs.is_empty() && sigs.iter().all(|sig| !sig.data.is_empty())
}

fn hex_address(key: &TxPublicKey) -> String {
    hex::encode(key.address())
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::KeyAlgo;

    use super::*;
    use crate::{
        msgs::{Coin, CosmosMsg, MsgSend},
        tx::{AuthInfo, Fee, TxBody},
    };

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[seed; 32]).unwrap()
    }

    fn draft(from: &PrivateKey) -> Tx {
        let from = from.public_key().account_id("xpla").unwrap().to_string();
        Tx {
            body: TxBody {
                messages: vec![CosmosMsg::BankSend(MsgSend {
                    from_address: from.clone(),
                    to_address: from,
                    amount: vec![Coin::new("axpriv", 1)],
                })],
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: vec![],
                fee: Fee {
                    amount: vec![Coin::new("axpriv", 10)],
                    gas_limit: 1,
                    ..Default::default()
                },
            },
            signatures: vec![],
        }
    }

    fn data() -> SignerData {
        SignerData {
            chain_id: "cube_47-5".into(),
            account_number: 1,
            sequence: 2,
        }
    }

    #[test]
    fn round_signs_and_verifies() {
        let key = key(1);
        let mut tx = draft(&key);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        let sigs = sign_round(&mut tx, &[signer], SignMode::Direct, true).unwrap();
        assert!(is_fully_signed(&sigs));
        assert!(tx.is_signed());

        let bytes = sign_bytes(SignMode::Direct, &tx, &data()).unwrap();
        assert!(key.public_key().verify(&bytes, &tx.signatures[0]));
        assert_eq!(tx.signatures_v2().unwrap(), sigs);
    }

    #[test]
    fn pass_two_without_slot_fails() {
        let key = key(1);
        let mut tx = draft(&key);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        let err = sign_slot(&mut tx, &signer, SignMode::Direct).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(tx.signatures.is_empty());
    }

    #[test]
    fn append_keeps_previous_signatures() {
        let first = key(1);
        let mut tx = draft(&first);
        let signer = SignerKey {
            key: &first,
            data: data(),
        };
        sign_round(&mut tx, &[signer], SignMode::LegacyAminoJson, true).unwrap();
        let previous = tx.signatures[0].clone();

        let second = key(2);
        let signer = SignerKey {
            key: &second,
            data: data(),
        };
        sign_round(&mut tx, &[signer], SignMode::LegacyAminoJson, false).unwrap();
        assert_eq!(tx.signatures.len(), 2);
        assert_eq!(tx.signatures[0], previous);
    }

    #[test]
    fn appending_an_existing_signer_is_rejected() {
        let key = key(1);
        let mut tx = draft(&key);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        sign_round(&mut tx, &[signer], SignMode::LegacyAminoJson, true).unwrap();
        let signed = tx.clone();

        let again = SignerKey {
            key: &key,
            data: data(),
        };
        let err = sign_round(&mut tx, &[again], SignMode::LegacyAminoJson, false).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(tx, signed);
        assert!(tx.signatures.iter().all(|signature| !signature.is_empty()));
    }

    #[test]
    fn pass_two_fills_the_empty_slot() {
        let key = key(1);
        let mut tx = draft(&key);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        sign_round(&mut tx, &[signer], SignMode::LegacyAminoJson, true).unwrap();
        let first = tx.signatures[0].clone();

        let mut slots = tx.signatures_v2().unwrap();
        slots.push(SignatureV2::placeholder(
            key.public_key().into(),
            SignMode::LegacyAminoJson,
            2,
        ));
        tx.set_signatures(slots);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        sign_slot(&mut tx, &signer, SignMode::LegacyAminoJson).unwrap();
        assert_eq!(tx.signatures[0], first);
        assert!(!tx.signatures[1].is_empty());

        let err = sign_slot(&mut tx, &signer, SignMode::LegacyAminoJson).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn pass_two_with_missing_signatures_fails() {
        let key = key(1);
        let mut tx = draft(&key);
        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        sign_round(&mut tx, &[signer], SignMode::Direct, true).unwrap();
        tx.signatures.clear();

        let signer = SignerKey {
            key: &key,
            data: data(),
        };
        let err = sign_slot(&mut tx, &signer, SignMode::Direct).unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch(_)));
    }

    #[test]
    fn signature_json_shape() {
        let key = key(1);
        let sig = SignatureV2 {
            public_key: key.public_key().into(),
            data: SignatureData::Single {
                mode: SignMode::LegacyAminoJson,
                signature: vec![1, 2, 3],
            },
            sequence: 5,
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["data"]["single"]["mode"], "SIGN_MODE_LEGACY_AMINO_JSON");
        assert_eq!(json["data"]["single"]["signature"], "AQID");
        assert_eq!(json["sequence"], "5");
    }
}
