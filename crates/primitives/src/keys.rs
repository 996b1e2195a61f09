use std::fmt;

use alloy_primitives::keccak256;
use cosmrs::AccountId;
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, SecretKey, SECP256K1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString, IntoStaticStr};
use zeroize::Zeroizing;

use crate::{
    consts::{
        ETH_SECP256K1_AMINO_NAME, ETH_SECP256K1_PUBKEY_TYPE_URL, SECP256K1_AMINO_NAME,
        SECP256K1_PUBKEY_TYPE_URL,
    },
    error::{Error, Result},
};

/// Signature scheme of an account key.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum KeyAlgo {
    /// Cosmos secp256k1: sha256 digests, ripemd160 addresses.
    #[serde(rename = "secp256k1")]
    #[strum(serialize = "secp256k1")]
    Secp256k1,
    /// Ethermint secp256k1: keccak256 digests, Ethereum addresses.
    #[default]
    #[serde(rename = "eth_secp256k1")]
    #[strum(serialize = "eth_secp256k1")]
    EthSecp256k1,
}

impl KeyAlgo {
    pub fn pubkey_type_url(&self) -> &'static str {
        match self {
            KeyAlgo::Secp256k1 => SECP256K1_PUBKEY_TYPE_URL,
            KeyAlgo::EthSecp256k1 => ETH_SECP256K1_PUBKEY_TYPE_URL,
        }
    }

    pub fn from_pubkey_type_url(type_url: &str) -> Option<Self> {
        match type_url {
            SECP256K1_PUBKEY_TYPE_URL => Some(KeyAlgo::Secp256k1),
            ETH_SECP256K1_PUBKEY_TYPE_URL => Some(KeyAlgo::EthSecp256k1),
            _ => None,
        }
    }

    pub fn amino_name(&self) -> &'static str {
        match self {
            KeyAlgo::Secp256k1 => SECP256K1_AMINO_NAME,
            KeyAlgo::EthSecp256k1 => ETH_SECP256K1_AMINO_NAME,
        }
    }

    pub fn from_amino_name(name: &str) -> Option<Self> {
        match name {
            SECP256K1_AMINO_NAME => Some(KeyAlgo::Secp256k1),
            ETH_SECP256K1_AMINO_NAME => Some(KeyAlgo::EthSecp256k1),
            _ => None,
        }
    }

    fn digest(&self, payload: &[u8]) -> Message {
        let digest: [u8; 32] = match self {
            KeyAlgo::Secp256k1 => Sha256::digest(payload).into(),
            KeyAlgo::EthSecp256k1 => keccak256(payload).0,
        };
        Message::from_digest(digest)
    }
}

/// A secp256k1 account key. The secret is erased on drop.
pub struct PrivateKey {
    algo: KeyAlgo,
    secret: SecretKey,
}

impl PrivateKey {
    pub fn from_slice(algo: KeyAlgo, bytes: &[u8]) -> Result<Self> {
        let secret = SecretKey::from_slice(bytes).map_err(|e| Error::parse("private key", e))?;
        Ok(Self { algo, secret })
    }

    /// Parse a hex-encoded key, with or without a `0x` prefix.
    pub fn from_hex(algo: KeyAlgo, hex_key: &str) -> Result<Self> {
        let hex_key = hex_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = Zeroizing::new(
            hex::decode(hex_key).map_err(|e| Error::parse("private key hex", e))?,
        );
        Self::from_slice(algo, &bytes)
    }

    pub fn algo(&self) -> KeyAlgo {
        self.algo
    }

    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.secret_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            algo: self.algo,
            key: secp256k1::PublicKey::from_secret_key(SECP256K1, &self.secret),
        }
    }

    /// Sign `payload` under the key's digest rule.
    ///
    /// `secp256k1` keys return the 64-byte compact `r || s`; `eth_secp256k1` keys append the
    /// recovery id as a 65th byte.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let msg = self.algo.digest(payload);
        match self.algo {
            KeyAlgo::Secp256k1 => SECP256K1
                .sign_ecdsa(&msg, &self.secret)
                .serialize_compact()
                .to_vec(),
            KeyAlgo::EthSecp256k1 => {
                let (recovery_id, rs) = SECP256K1
                    .sign_ecdsa_recoverable(&msg, &self.secret)
                    .serialize_compact();
                let mut sig = rs.to_vec();
                sig.push(recovery_id.to_i32() as u8);
                sig
            }
        }
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self {
            algo: self.algo,
            secret: self.secret,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algo", &self.algo)
            .field("public_key", &self.public_key())
            .finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    algo: KeyAlgo,
    key: secp256k1::PublicKey,
}

impl PublicKey {
    /// Accepts the 33-byte compressed or 65-byte uncompressed SEC1 encoding.
    pub fn from_slice(algo: KeyAlgo, bytes: &[u8]) -> Result<Self> {
        let key =
            secp256k1::PublicKey::from_slice(bytes).map_err(|e| Error::parse("public key", e))?;
        Ok(Self { algo, key })
    }

    pub fn algo(&self) -> KeyAlgo {
        self.algo
    }

    /// Compressed SEC1 encoding.
    pub fn to_bytes(&self) -> [u8; 33] {
        self.key.serialize()
    }

    pub fn type_url(&self) -> &'static str {
        self.algo.pubkey_type_url()
    }

    pub fn address(&self) -> [u8; 20] {
        match self.algo {
            KeyAlgo::Secp256k1 => {
                let sha = Sha256::digest(self.key.serialize());
                Ripemd160::digest(sha).into()
            }
            KeyAlgo::EthSecp256k1 => {
                let uncompressed = self.key.serialize_uncompressed();
                let hash = keccak256(&uncompressed[1..]);
                let mut address = [0u8; 20];
                address.copy_from_slice(&hash[12..]);
                address
            }
        }
    }

    pub fn account_id(&self, prefix: &str) -> Result<AccountId> {
        AccountId::new(prefix, &self.address()).map_err(|e| Error::parse("account address", e))
    }

    /// Verify a signature produced by [`PrivateKey::sign`] for the same algorithm.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let rs = match (self.algo, signature.len()) {
            (KeyAlgo::Secp256k1, 64) => signature,
            (KeyAlgo::EthSecp256k1, 64 | 65) => &signature[..64],
            _ => return false,
        };
        let Ok(sig) = Signature::from_compact(rs) else {
            return false;
        };
        SECP256K1
            .verify_ecdsa(&self.algo.digest(payload), &sig, &self.key)
            .is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, 0x{})", self.algo, hex::encode(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn algo_names() {
        assert_eq!(KeyAlgo::default(), KeyAlgo::EthSecp256k1);
        assert_eq!("eth_secp256k1".parse::<KeyAlgo>().unwrap(), KeyAlgo::EthSecp256k1);
        assert_eq!(KeyAlgo::Secp256k1.to_string(), "secp256k1");
        assert_eq!(
            KeyAlgo::from_pubkey_type_url("/ethermint.crypto.v1.ethsecp256k1.PubKey"),
            Some(KeyAlgo::EthSecp256k1)
        );
    }

    #[test]
    fn cosmos_address_is_hash160() {
        let key = PrivateKey::from_hex(KeyAlgo::Secp256k1, KEY_ONE).unwrap();
        assert_eq!(
            hex::encode(key.public_key().address()),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn eth_address_is_keccak_tail() {
        let key = PrivateKey::from_hex(KeyAlgo::EthSecp256k1, KEY_ONE).unwrap();
        assert_eq!(
            hex::encode(key.public_key().address()),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn sign_and_verify() {
        for algo in [KeyAlgo::Secp256k1, KeyAlgo::EthSecp256k1] {
            let key = PrivateKey::from_hex(algo, KEY_ONE).unwrap();
            let sig = key.sign(b"payload");
            let expected_len = if algo == KeyAlgo::Secp256k1 { 64 } else { 65 };
            assert_eq!(sig.len(), expected_len);
            assert!(key.public_key().verify(b"payload", &sig));
            assert!(!key.public_key().verify(b"other payload", &sig));
        }
    }

    #[test]
    fn signatures_are_deterministic() {
        let key = PrivateKey::from_hex(KeyAlgo::Secp256k1, KEY_ONE).unwrap();
        assert_eq!(key.sign(b"payload"), key.sign(b"payload"));
    }

    #[test]
    fn verification_is_bound_to_the_key() {
        let one = PrivateKey::from_hex(KeyAlgo::Secp256k1, KEY_ONE).unwrap();
        let two = PrivateKey::from_slice(KeyAlgo::Secp256k1, &[2u8; 32]).unwrap();
        let sig = one.sign(b"payload");
        assert!(!two.public_key().verify(b"payload", &sig));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(PrivateKey::from_hex(KeyAlgo::Secp256k1, "zz").is_err());
        assert!(PrivateKey::from_slice(KeyAlgo::Secp256k1, &[0u8; 32]).is_err());
        assert!(PublicKey::from_slice(KeyAlgo::Secp256k1, &[1u8; 33]).is_err());
    }

    #[test]
    fn bech32_account() {
        let key = PrivateKey::from_hex(KeyAlgo::EthSecp256k1, KEY_ONE).unwrap();
        let account = key.public_key().account_id("xpla").unwrap();
        assert!(account.to_string().starts_with("xpla1"));
        assert_eq!(account.to_bytes(), key.public_key().address().to_vec());
    }
}
