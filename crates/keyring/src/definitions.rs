use std::path::{Path, PathBuf};

use kestrel_primitives::{
    fs::{read_document, write_document},
    Error, KeyAlgo, PrivateKey, PublicKey, Result,
};
use kestrel_tx::{MultisigPubKey, TxPublicKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{read_secret_string, ZeroizeString};

/// The file name for the serialized `Keyring`.
pub const KEYRING_FILENAME: &str = "keyring.yml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub key: KeyKind,
}

/// A hex-encoded public key together with its algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKey {
    #[serde(default)]
    pub algo: KeyAlgo,
    pub public_key: String,
}

impl MemberKey {
    pub fn new(key: &PublicKey) -> Self {
        Self {
            algo: key.algo(),
            public_key: hex::encode(key.to_bytes()),
        }
    }

    pub fn decode(&self) -> Result<PublicKey> {
        let hex_key = self.public_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).map_err(|e| Error::parse("member public key", e))?;
        PublicKey::from_slice(self.algo, &bytes)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KeyKind {
    /// A secp256k1 key held in this file or in a dedicated secret file.
    #[serde(rename = "local")]
    Local {
        #[serde(default)]
        algo: KeyAlgo,
        #[serde(skip_serializing_if = "Option::is_none")]
        private_key: Option<ZeroizeString>,
        #[serde(skip_serializing_if = "Option::is_none")]
        private_key_path: Option<PathBuf>,
    },
    /// A threshold multisig over member public keys, in declared order.
    #[serde(rename = "multisig")]
    Multisig {
        threshold: u32,
        public_keys: Vec<MemberKey>,
    },
}

impl KeyDefinition {
    pub fn local(name: impl Into<String>, key: &PrivateKey) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            key: KeyKind::Local {
                algo: key.algo(),
                private_key: Some(ZeroizeString::from(hex::encode(*key.secret_bytes()))),
                private_key_path: None,
            },
        }
    }

    pub fn multisig(name: impl Into<String>, multisig: &MultisigPubKey) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            key: KeyKind::Multisig {
                threshold: multisig.threshold(),
                public_keys: multisig.members().iter().map(MemberKey::new).collect(),
            },
        }
    }

    pub fn private_key(&self) -> Result<PrivateKey> {
        match &self.key {
            KeyKind::Local {
                algo,
                private_key: Some(secret),
                ..
            } => PrivateKey::from_hex(*algo, secret.as_str()),
            KeyKind::Local {
                algo,
                private_key_path: Some(path),
                ..
            } => {
                let secret = read_secret_string(path).map_err(|e| {
                    Error::parse(format!("private key file {}", path.display()), e)
                })?;
                PrivateKey::from_hex(*algo, secret.as_str())
            }
            KeyKind::Local { .. } => Err(Error::InsufficientParams(format!(
                "key {} has neither a private key nor a private key path",
                self.name
            ))),
            KeyKind::Multisig { .. } => Err(Error::InvalidRequest(format!(
                "key {} is a multisig and holds no private key",
                self.name
            ))),
        }
    }

    pub fn multisig_key(&self) -> Result<MultisigPubKey> {
        match &self.key {
            KeyKind::Multisig {
                threshold,
                public_keys,
            } => {
                let members = public_keys
                    .iter()
                    .map(MemberKey::decode)
                    .collect::<Result<Vec<_>>>()?;
                MultisigPubKey::new(*threshold, members)
            }
            KeyKind::Local { .. } => Err(Error::InvalidRequest(format!(
                "key {} is not a multisig key",
                self.name
            ))),
        }
    }

    pub fn public_key(&self) -> Result<TxPublicKey> {
        match &self.key {
            KeyKind::Local { .. } => Ok(self.private_key()?.public_key().into()),
            KeyKind::Multisig { .. } => Ok(self.multisig_key()?.into()),
        }
    }
}

/// A list of `KeyDefinition` that serves as a serde-able keyring file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Keyring(Vec<KeyDefinition>);

impl From<Vec<KeyDefinition>> for Keyring {
    fn from(vec: Vec<KeyDefinition>) -> Self {
        Self(vec)
    }
}

impl Keyring {
    /// Open an existing file or create a new, empty one if it does not exist.
    pub fn open_or_create<P: AsRef<Path>>(keyring_dir: P) -> Result<Self> {
        let dir = keyring_dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::InvalidRequest(format!("unable to create keyring dir {}: {e}", dir.display()))
        })?;
        if !dir.join(KEYRING_FILENAME).exists() {
            Self::default().save(dir)?;
        }
        Self::open(dir)
    }

    /// Open an existing file, returning an error if the file does not exist.
    pub fn open<P: AsRef<Path>>(keyring_dir: P) -> Result<Self> {
        let path = keyring_dir.as_ref().join(KEYRING_FILENAME);
        let bytes = read_document(&path)?;
        let keyring: Self = serde_yaml::from_slice(&bytes)
            .map_err(|e| Error::parse(format!("keyring {}", path.display()), e))?;
        debug!(path = %path.display(), keys = keyring.len(), "Opened keyring");
        Ok(keyring)
    }

    /// Encodes `self` as YAML and atomically writes it to `KEYRING_FILENAME` in
    /// `keyring_dir`.
    pub fn save<P: AsRef<Path>>(&self, keyring_dir: P) -> Result<()> {
        let path = keyring_dir.as_ref().join(KEYRING_FILENAME);
        let bytes = serde_yaml::to_string(self).map_err(|e| Error::parse("keyring", e))?;
        write_document(&path, bytes.as_bytes())?;
        Ok(())
    }

    pub fn as_slice(&self) -> &[KeyDefinition] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&KeyDefinition> {
        self.0
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Add `def`, replacing any definition with the same name.
    pub fn insert(&mut self, def: KeyDefinition) {
        match self.0.iter_mut().find(|existing| existing.name == def.name) {
            Some(existing) => *existing = def,
            None => self.0.push(def),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let len = self.0.len();
        self.0.retain(|def| def.name != name);
        len != self.0.len()
    }
}
