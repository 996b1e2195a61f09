use kestrel_primitives::{Error, Result};

use crate::{
    pubkey::TxPublicKey,
    sign_mode::{sign_bytes, SignerData},
    signer::{SignatureData, SignatureV2},
    tx::Tx,
};

/// Verify `sig` over `tx` under `signer`.
///
/// A key that does not verify yields [`Error::SignatureInvalid`]; a multisig carrying fewer
/// member signatures than its threshold yields [`Error::InsufficientSignatures`].
pub fn verify_signature(tx: &Tx, sig: &SignatureV2, signer: &SignerData) -> Result<()> {
    verify_data(tx, &sig.public_key, &sig.data, signer)
}

fn verify_data(
    tx: &Tx,
    public_key: &TxPublicKey,
    data: &SignatureData,
    signer: &SignerData,
) -> Result<()> {
    match (public_key, data) {
        (TxPublicKey::Single(key), SignatureData::Single { mode, signature }) => {
            let payload = sign_bytes(*mode, tx, signer)?;
            if key.verify(&payload, signature) {
                Ok(())
            } else {
                Err(Error::SignatureInvalid(format!(
                    "signature does not verify for {}",
                    hex::encode(key.address())
                )))
            }
        }
        (
            TxPublicKey::Multisig(multisig),
            SignatureData::Multi {
                bitarray,
                signatures,
            },
        ) => {
            let members = multisig.members();
            if bitarray.len() != members.len() {
                return Err(Error::SignatureInvalid(format!(
                    "bit array covers {} members, key has {}",
                    bitarray.len(),
                    members.len()
                )));
            }
            if bitarray.count_ones() != signatures.len() {
                return Err(Error::SignatureInvalid(format!(
                    "bit array marks {} signers, found {} signatures",
                    bitarray.count_ones(),
                    signatures.len()
                )));
            }
            if signatures.len() < multisig.threshold() as usize {
                return Err(Error::InsufficientSignatures {
                    have: signatures.len(),
                    threshold: multisig.threshold() as usize,
                });
            }
            for (member, member_sig) in bitarray.ones().zip(signatures) {
                verify_data(tx, &TxPublicKey::Single(members[member]), member_sig, signer)?;
            }
            Ok(())
        }
        _ => Err(Error::SignatureInvalid(
            "signature data does not match the public key type".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{ErrorKind, KeyAlgo, PrivateKey};

    use super::*;
    use crate::{
        msgs::{Coin, CosmosMsg, MsgSend},
        sign_mode::SignMode,
        signer::{sign_round, SignerKey},
        tx::TxBody,
    };

    fn signed(key: &PrivateKey, data: &SignerData) -> Tx {
        let from = key.public_key().account_id("xpla").unwrap().to_string();
        let mut tx = Tx {
            body: TxBody {
                messages: vec![CosmosMsg::BankSend(MsgSend {
                    from_address: from.clone(),
                    to_address: from,
                    amount: vec![Coin::new("axpriv", 1)],
                })],
                ..Default::default()
            },
            ..Default::default()
        };
        let signer = SignerKey {
            key,
            data: data.clone(),
        };
        sign_round(&mut tx, &[signer], SignMode::Direct, true).unwrap();
        tx
    }

    fn data() -> SignerData {
        SignerData {
            chain_id: "cube_47-5".into(),
            account_number: 3,
            sequence: 1,
        }
    }

    #[test]
    fn valid_signature() {
        let key = PrivateKey::from_slice(KeyAlgo::Secp256k1, &[4u8; 32]).unwrap();
        let tx = signed(&key, &data());
        let sig = &tx.signatures_v2().unwrap()[0];
        verify_signature(&tx, sig, &data()).unwrap();
    }

    #[test]
    fn wrong_signer_data_is_invalid() {
        let key = PrivateKey::from_slice(KeyAlgo::Secp256k1, &[4u8; 32]).unwrap();
        let tx = signed(&key, &data());
        let sig = &tx.signatures_v2().unwrap()[0];
        let mut other = data();
        other.chain_id = "other_1-1".into();
        let err = verify_signature(&tx, sig, &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
    }

    #[test]
    fn corrupted_signature_is_invalid() {
        let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[4u8; 32]).unwrap();
        let mut tx = signed(&key, &data());
        tx.signatures[0][5] ^= 0x01;
        let sig = &tx.signatures_v2().unwrap()[0];
        assert!(matches!(
            verify_signature(&tx, sig, &data()),
            Err(Error::SignatureInvalid(_))
        ));
    }
}
