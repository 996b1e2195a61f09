use std::fmt;

use cosmrs::AccountId;
use kestrel_primitives::{Error, Result};
use serde::Serialize;

use crate::{sign_mode::SignerData, tx::Tx, verify::verify_signature};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SignatureStatus {
    Ok,
    /// The key does not belong to the signer declared at this position.
    Mismatch,
    Invalid(String),
    /// No account number to verify against without a node.
    Unverified(String),
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureStatus::Ok => f.write_str("OK"),
            SignatureStatus::Mismatch => {
                f.write_str("ERROR: signature does not match its respective signer")
            }
            SignatureStatus::Invalid(reason) => write!(f, "ERROR: signature invalid: {reason}"),
            SignatureStatus::Unverified(reason) => write!(f, "UNVERIFIED: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignerReport {
    pub index: usize,
    pub address: String,
    pub sequence: u64,
    pub status: SignatureStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub signers: Vec<String>,
    pub signatures: Vec<SignerReport>,
    pub success: bool,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signers:")?;
        for (i, signer) in self.signers.iter().enumerate() {
            writeln!(f, "  {i}: {signer}")?;
        }
        writeln!(f)?;
        writeln!(f, "Signatures:")?;
        for sig in &self.signatures {
            writeln!(f, "  {}: {} [{}]", sig.index, sig.address, sig.status)?;
        }
        if self.signatures.len() != self.signers.len() {
            writeln!(
                f,
                "ERROR: expected {} signatures, found {}",
                self.signers.len(),
                self.signatures.len()
            )?;
        }
        Ok(())
    }
}

/// Check every signature against the signer declared at its position, then verify it.
///
/// `account_numbers` holds one account number per declared signer; without it (offline) the
/// cryptographic check is skipped and reported as unverified.
pub fn validate_signatures(
    tx: &Tx,
    chain_id: &str,
    prefix: &str,
    account_numbers: Option<&[u64]>,
) -> Result<ValidationReport> {
    let signers = tx.signers()?;
    let signer_bytes = signers
        .iter()
        .map(|s| {
            s.parse::<AccountId>()
                .map(|id| id.to_bytes())
                .map_err(|e| Error::parse("signer address", e))
        })
        .collect::<Result<Vec<_>>>()?;
    let sigs = tx.signatures_v2()?;

    let mut success = sigs.len() == signers.len();
    let mut reports = Vec::with_capacity(sigs.len());
    for (index, sig) in sigs.iter().enumerate() {
        let address = sig.public_key.address();
        let status = match signer_bytes.get(index) {
            Some(expected) if expected.as_slice() == address.as_slice() => {
                match account_numbers.and_then(|numbers| numbers.get(index)) {
                    None => SignatureStatus::Unverified("offline".into()),
                    Some(&account_number) => {
                        let data = SignerData {
                            chain_id: chain_id.to_string(),
                            account_number,
                            sequence: sig.sequence,
                        };
                        match verify_signature(tx, sig, &data) {
                            Ok(()) => SignatureStatus::Ok,
                            Err(e) => SignatureStatus::Invalid(e.to_string()),
                        }
                    }
                }
            }
            _ => SignatureStatus::Mismatch,
        };
        if matches!(status, SignatureStatus::Mismatch | SignatureStatus::Invalid(_)) {
            success = false;
        }
        reports.push(SignerReport {
            index,
            address: sig.public_key.account_id(prefix)?.to_string(),
            sequence: sig.sequence,
            status,
        });
    }

    Ok(ValidationReport {
        signers,
        signatures: reports,
        success,
    })
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{KeyAlgo, PrivateKey};

    use super::*;
    use crate::{
        msgs::{Coin, CosmosMsg, MsgSend},
        sign_mode::SignMode,
        signer::{sign_round, SignerKey},
        tx::TxBody,
    };

    const CHAIN: &str = "cube_47-5";

    fn send_from(key: &PrivateKey) -> CosmosMsg {
        let from = key.public_key().account_id("xpla").unwrap().to_string();
        CosmosMsg::BankSend(MsgSend {
            from_address: from.clone(),
            to_address: from,
            amount: vec![Coin::new("axpriv", 1)],
        })
    }

    fn signed(msgs: Vec<CosmosMsg>, keys: &[&PrivateKey]) -> Tx {
        let mut tx = Tx {
            body: TxBody {
                messages: msgs,
                ..Default::default()
            },
            ..Default::default()
        };
        let signers = keys
            .iter()
            .map(|key| SignerKey {
                key,
                data: SignerData {
                    chain_id: CHAIN.into(),
                    account_number: 7,
                    sequence: 0,
                },
            })
            .collect::<Vec<_>>();
        sign_round(&mut tx, &signers, SignMode::LegacyAminoJson, true).unwrap();
        tx
    }

    #[test]
    fn valid_online() {
        let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[1u8; 32]).unwrap();
        let tx = signed(vec![send_from(&key)], &[&key]);
        let report = validate_signatures(&tx, CHAIN, "xpla", Some(&[7])).unwrap();
        assert!(report.success);
        assert_eq!(report.signatures[0].status, SignatureStatus::Ok);
        assert!(report.to_string().contains("[OK]"));
    }

    #[test]
    fn offline_is_unverified_but_ordered() {
        let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[1u8; 32]).unwrap();
        let tx = signed(vec![send_from(&key)], &[&key]);
        let report = validate_signatures(&tx, CHAIN, "xpla", None).unwrap();
        assert!(report.success);
        assert!(matches!(report.signatures[0].status, SignatureStatus::Unverified(_)));
    }

    #[test]
    fn swapped_signers_mismatch() {
        let a = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[1u8; 32]).unwrap();
        let b = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[2u8; 32]).unwrap();
        let tx = signed(vec![send_from(&a), send_from(&b)], &[&b, &a]);
        let report = validate_signatures(&tx, CHAIN, "xpla", Some(&[7, 7])).unwrap();
        assert!(!report.success);
        assert_eq!(report.signatures[0].status, SignatureStatus::Mismatch);
        assert!(report
            .to_string()
            .contains("ERROR: signature does not match its respective signer"));
    }

    #[test]
    fn wrong_account_number_is_invalid_not_mismatch() {
        let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[1u8; 32]).unwrap();
        let tx = signed(vec![send_from(&key)], &[&key]);
        let report = validate_signatures(&tx, CHAIN, "xpla", Some(&[8])).unwrap();
        assert!(!report.success);
        assert!(matches!(report.signatures[0].status, SignatureStatus::Invalid(_)));
    }

    #[test]
    fn missing_signature_fails() {
        let a = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[1u8; 32]).unwrap();
        let b = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[2u8; 32]).unwrap();
        let tx = signed(vec![send_from(&a), send_from(&b)], &[&a]);
        let report = validate_signatures(&tx, CHAIN, "xpla", None).unwrap();
        assert!(!report.success);
        assert!(report.to_string().contains("expected 2 signatures, found 1"));
    }
}
