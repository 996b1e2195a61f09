//! Named signing keys and multisig definitions, persisted as one YAML file.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

pub mod definitions;

pub use self::definitions::*;

/// Provides a new-type wrapper around `String` that is zeroized on `Drop`.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct ZeroizeString(String);

impl From<String> for ZeroizeString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl ZeroizeString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn without_newlines(&self) -> ZeroizeString {
        Self(self.0.trim_end_matches(['\r', '\n']).into())
    }
}

impl std::fmt::Debug for ZeroizeString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ZeroizeString(<redacted>)")
    }
}

/// Reads a secret file into a `ZeroizeString`, with trailing new-lines removed.
pub fn read_secret_string<P: AsRef<Path>>(path: P) -> Result<ZeroizeString, String> {
    let bytes = zeroize::Zeroizing::new(
        fs::read(path).map_err(|e| format!("Error opening file: {:?}", e))?,
    );
    let text = std::str::from_utf8(&bytes).map_err(|e| format!("Error decoding utf8: {:?}", e))?;
    Ok(ZeroizeString(text.to_string()).without_newlines())
}
