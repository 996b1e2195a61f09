//! Public keys as they appear in signer infos: a single account key or a threshold multisig
//! (`LegacyAminoPubKey`).

use cosmrs::{
    proto::{
        cosmos::crypto::{multisig::LegacyAminoPubKey, secp256k1::PubKey as ProtoPubKey},
        prost::Message,
    },
    AccountId, Any,
};
use kestrel_primitives::{
    consts::{MULTISIG_AMINO_NAME, MULTISIG_PUBKEY_TYPE_URL},
    Error, KeyAlgo, PublicKey, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::{base64::Base64, serde_as};
use sha2::{Digest, Sha256};

/// Threshold multisig key; member order is significant for addresses and bit positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigPubKey {
    threshold: u32,
    members: Vec<PublicKey>,
}

impl MultisigPubKey {
    pub fn new(threshold: u32, members: Vec<PublicKey>) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::InvalidRequest("multisig threshold must be positive".into()));
        }
        if threshold as usize > members.len() {
            return Err(Error::InvalidRequest(format!(
                "multisig threshold {threshold} exceeds {} members",
                members.len()
            )));
        }
        Ok(Self { threshold, members })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn members(&self) -> &[PublicKey] {
        &self.members
    }

    /// Index of the member owning `address`.
    pub fn position(&self, address: &[u8; 20]) -> Option<usize> {
        self.members.iter().position(|m| &m.address() == address)
    }

    fn amino_bytes(&self) -> Vec<u8> {
        let mut out = amino_prefix(MULTISIG_AMINO_NAME).to_vec();
        out.push(0x08);
        put_uvarint(&mut out, self.threshold as u64);
        for member in &self.members {
            let encoded = single_amino_bytes(member);
            out.push(0x12);
            put_uvarint(&mut out, encoded.len() as u64);
            out.extend_from_slice(&encoded);
        }
        out
    }

    /// `sha256(amino(key))[..20]`.
    pub fn address(&self) -> [u8; 20] {
        let digest = Sha256::digest(self.amino_bytes());
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[..20]);
        address
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PubKeyJson", into = "PubKeyJson")]
pub enum TxPublicKey {
    Single(PublicKey),
    Multisig(MultisigPubKey),
}

impl From<PublicKey> for TxPublicKey {
    fn from(key: PublicKey) -> Self {
        TxPublicKey::Single(key)
    }
}

impl From<MultisigPubKey> for TxPublicKey {
    fn from(key: MultisigPubKey) -> Self {
        TxPublicKey::Multisig(key)
    }
}

impl TxPublicKey {
    pub fn type_url(&self) -> &'static str {
        match self {
            TxPublicKey::Single(key) => key.type_url(),
            TxPublicKey::Multisig(_) => MULTISIG_PUBKEY_TYPE_URL,
        }
    }

    pub fn address(&self) -> [u8; 20] {
        match self {
            TxPublicKey::Single(key) => key.address(),
            TxPublicKey::Multisig(key) => key.address(),
        }
    }

    pub fn account_id(&self, prefix: &str) -> Result<AccountId> {
        AccountId::new(prefix, &self.address()).map_err(|e| Error::parse("account address", e))
    }

    pub fn to_any(&self) -> Any {
        let value = match self {
            TxPublicKey::Single(key) => ProtoPubKey {
                key: key.to_bytes().to_vec(),
            }
            .encode_to_vec(),
            TxPublicKey::Multisig(key) => LegacyAminoPubKey {
                threshold: key.threshold,
                public_keys: key
                    .members
                    .iter()
                    .map(|m| TxPublicKey::Single(*m).to_any())
                    .collect(),
            }
            .encode_to_vec(),
        };
        Any {
            type_url: self.type_url().to_string(),
            value,
        }
    }

    pub fn from_any(any: &Any) -> Result<Self> {
        if any.type_url == MULTISIG_PUBKEY_TYPE_URL {
            let proto = LegacyAminoPubKey::decode(any.value.as_slice())
                .map_err(|e| Error::parse("multisig public key", e))?;
            let members = proto
                .public_keys
                .iter()
                .map(|member| match TxPublicKey::from_any(member)? {
                    TxPublicKey::Single(key) => Ok(key),
                    TxPublicKey::Multisig(_) => Err(Error::parse(
                        "multisig public key",
                        "nested multisig keys are not supported",
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(TxPublicKey::Multisig(MultisigPubKey::new(proto.threshold, members)?));
        }

        let algo = KeyAlgo::from_pubkey_type_url(&any.type_url).ok_or_else(|| {
            Error::parse("public key", format!("unsupported key type {}", any.type_url))
        })?;
        let proto = ProtoPubKey::decode(any.value.as_slice())
            .map_err(|e| Error::parse("public key", e))?;
        Ok(TxPublicKey::Single(PublicKey::from_slice(algo, &proto.key)?))
    }

    /// Legacy amino JSON `{"type", "value"}` form.
    pub fn amino_json(&self) -> Value {
        match self {
            TxPublicKey::Single(key) => json!({
                "type": key.algo().amino_name(),
                "value": base64_encode(&key.to_bytes()),
            }),
            TxPublicKey::Multisig(key) => json!({
                "type": MULTISIG_AMINO_NAME,
                "value": {
                    "threshold": key.threshold.to_string(),
                    "pubkeys": key
                        .members
                        .iter()
                        .map(|m| TxPublicKey::Single(*m).amino_json())
                        .collect::<Vec<_>>(),
                },
            }),
        }
    }

    pub fn from_amino_json(value: &Value) -> Result<Self> {
        let malformed = |reason: &str| Error::parse("amino public key", reason);
        let name = value["type"].as_str().ok_or_else(|| malformed("missing type"))?;
        if name == MULTISIG_AMINO_NAME {
            let threshold = value["value"]["threshold"]
                .as_str()
                .ok_or_else(|| malformed("missing threshold"))?
                .parse::<u32>()
                .map_err(|e| Error::parse("amino multisig threshold", e))?;
            let members = value["value"]["pubkeys"]
                .as_array()
                .ok_or_else(|| malformed("missing pubkeys"))?
                .iter()
                .map(|m| match TxPublicKey::from_amino_json(m)? {
                    TxPublicKey::Single(key) => Ok(key),
                    TxPublicKey::Multisig(_) => Err(malformed("nested multisig")),
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(TxPublicKey::Multisig(MultisigPubKey::new(threshold, members)?));
        }

        let algo = KeyAlgo::from_amino_name(name)
            .ok_or_else(|| Error::parse("amino public key", format!("unsupported type {name}")))?;
        let bytes = base64_decode(value["value"].as_str().ok_or_else(|| malformed("missing value"))?)?;
        Ok(TxPublicKey::Single(PublicKey::from_slice(algo, &bytes)?))
    }
}

pub(crate) fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub(crate) fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::parse("base64", e))
}

/// Amino registered-type prefix: sha256 of the name with the leading zero bytes and the three
/// disambiguation bytes dropped.
pub(crate) fn amino_prefix(name: &str) -> [u8; 4] {
    let digest = Sha256::digest(name.as_bytes());
    let mut rest = digest.iter().copied().skip_while(|b| *b == 0).skip(3).skip_while(|b| *b == 0);
    let mut prefix = [0u8; 4];
    for byte in prefix.iter_mut() {
        *byte = rest.next().unwrap_or_default();
    }
    prefix
}

fn single_amino_bytes(key: &PublicKey) -> Vec<u8> {
    let mut out = amino_prefix(key.algo().amino_name()).to_vec();
    let bytes = key.to_bytes();
    put_uvarint(&mut out, bytes.len() as u64);
    out.extend_from_slice(&bytes);
    out
}

pub(crate) fn put_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
struct PubKeyJson {
    #[serde(rename = "@type")]
    type_url: String,
    #[serde_as(as = "Option<Base64>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_keys: Option<Vec<TxPublicKey>>,
}

impl From<TxPublicKey> for PubKeyJson {
    fn from(key: TxPublicKey) -> Self {
        match key {
            TxPublicKey::Single(key) => PubKeyJson {
                type_url: key.type_url().to_string(),
                key: Some(key.to_bytes().to_vec()),
                threshold: None,
                public_keys: None,
            },
            TxPublicKey::Multisig(key) => PubKeyJson {
                type_url: MULTISIG_PUBKEY_TYPE_URL.to_string(),
                key: None,
                threshold: Some(key.threshold),
                public_keys: Some(key.members.into_iter().map(TxPublicKey::Single).collect()),
            },
        }
    }
}

impl TryFrom<PubKeyJson> for TxPublicKey {
    type Error = Error;

    fn try_from(json: PubKeyJson) -> Result<Self> {
        if json.type_url == MULTISIG_PUBKEY_TYPE_URL {
            let members = json
                .public_keys
                .unwrap_or_default()
                .into_iter()
                .map(|m| match m {
                    TxPublicKey::Single(key) => Ok(key),
                    TxPublicKey::Multisig(_) => {
                        Err(Error::parse("multisig public key", "nested multisig keys"))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(TxPublicKey::Multisig(MultisigPubKey::new(
                json.threshold.unwrap_or_default(),
                members,
            )?));
        }

        let algo = KeyAlgo::from_pubkey_type_url(&json.type_url).ok_or_else(|| {
            Error::parse("public key", format!("unsupported key type {}", json.type_url))
        })?;
        let key = json
            .key
            .ok_or_else(|| Error::parse("public key", "missing key bytes"))?;
        Ok(TxPublicKey::Single(PublicKey::from_slice(algo, &key)?))
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::PrivateKey;

    use super::*;

    fn key(algo: KeyAlgo, seed: u8) -> PublicKey {
        PrivateKey::from_slice(algo, &[seed; 32]).unwrap().public_key()
    }

    fn multisig() -> MultisigPubKey {
        MultisigPubKey::new(
            2,
            vec![
                key(KeyAlgo::Secp256k1, 1),
                key(KeyAlgo::Secp256k1, 2),
                key(KeyAlgo::Secp256k1, 3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn amino_prefixes_match_registered_names() {
        assert_eq!(hex::encode(amino_prefix("tendermint/PubKeySecp256k1")), "eb5ae987");
        assert_eq!(
            hex::encode(amino_prefix("tendermint/PubKeyMultisigThreshold")),
            "22c1f7e2"
        );
    }

    #[test]
    fn threshold_bounds() {
        let members = vec![key(KeyAlgo::Secp256k1, 1)];
        assert!(MultisigPubKey::new(0, members.clone()).is_err());
        assert!(MultisigPubKey::new(2, members.clone()).is_err());
        assert!(MultisigPubKey::new(1, members).is_ok());
    }

    #[test]
    fn multisig_address_depends_on_member_order() {
        let ordered = multisig();
        let mut members = ordered.members().to_vec();
        members.swap(0, 2);
        let reordered = MultisigPubKey::new(2, members).unwrap();
        assert_ne!(ordered.address(), reordered.address());
        assert_eq!(ordered.position(&ordered.members()[1].address()), Some(1));
    }

    #[test]
    fn any_and_json_round_trip() {
        for pk in [
            TxPublicKey::from(key(KeyAlgo::EthSecp256k1, 9)),
            TxPublicKey::from(multisig()),
        ] {
            assert_eq!(TxPublicKey::from_any(&pk.to_any()).unwrap(), pk);

            let json = serde_json::to_value(&pk).unwrap();
            assert_eq!(json["@type"], pk.type_url());
            assert_eq!(serde_json::from_value::<TxPublicKey>(json).unwrap(), pk);

            assert_eq!(TxPublicKey::from_amino_json(&pk.amino_json()).unwrap(), pk);
        }
    }

    #[test]
    fn multisig_json_shape() {
        let json = serde_json::to_value(TxPublicKey::from(multisig())).unwrap();
        assert_eq!(json["threshold"], 2);
        assert_eq!(json["public_keys"].as_array().unwrap().len(), 3);
        assert_eq!(json["public_keys"][0]["@type"], "/cosmos.crypto.secp256k1.PubKey");
    }
}
