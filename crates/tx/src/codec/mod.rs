//! Transport encodings: base64 wire bytes, signature documents, the legacy amino broadcast
//! envelope and the signature validation report.

mod amino;
mod signature_doc;
mod validate;

pub use self::{
    amino::{amino_broadcast_request, amino_multisignature},
    signature_doc::{read_signatures, SignatureDocument},
    validate::{validate_signatures, SignatureStatus, SignerReport, ValidationReport},
};

use kestrel_primitives::Result;

use crate::{
    pubkey::{base64_decode, base64_encode},
    tx::Tx,
};

/// Standard (not URL-safe) base64 of the `TxRaw` bytes.
pub fn encode_tx(tx: &Tx) -> Result<String> {
    Ok(base64_encode(&tx.to_bytes()?))
}

pub fn decode_tx(encoded: &str) -> Result<Tx> {
    Tx::from_bytes(&base64_decode(encoded)?)
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::ErrorKind;

    use super::*;
    use crate::{
        msgs::{Coin, CosmosMsg, MsgSend},
        tx::TxBody,
    };

    #[test]
    fn base64_round_trip() {
        let tx = Tx {
            body: TxBody {
                messages: vec![CosmosMsg::BankSend(MsgSend {
                    from_address: "xpla1from".into(),
                    to_address: "xpla1to".into(),
                    amount: vec![Coin::new("axpriv", 9)],
                })],
                memo: "relay".into(),
                ..Default::default()
            },
            signatures: vec![],
            ..Default::default()
        };
        let encoded = encode_tx(&tx).unwrap();
        assert!(!encoded.contains('-') && !encoded.contains('_'));
        assert_eq!(decode_tx(&encoded).unwrap(), tx);
    }

    #[test]
    fn bad_base64() {
        assert_eq!(decode_tx("not base64!").unwrap_err().kind(), ErrorKind::Parse);
    }
}
