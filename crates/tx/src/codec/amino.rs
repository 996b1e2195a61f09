use kestrel_primitives::{consts::AMINO_BROADCAST_MODE, Result};
use serde_json::{json, Value};

use crate::{
    bitarray::CompactBitArray,
    msgs::CosmosMsg,
    pubkey::{base64_encode, put_uvarint},
    sign_mode::amino_fee,
    signer::SignatureData,
    tx::Tx,
};

/// `{"tx": StdTx, "mode": "block|sync|async"}` for a signed transaction.
pub fn amino_broadcast_request(tx: &Tx) -> Result<Value> {
    let msgs = tx
        .body
        .messages
        .iter()
        .map(CosmosMsg::amino_json)
        .collect::<Result<Vec<_>>>()?;
    let signatures = tx
        .signatures_v2()?
        .into_iter()
        .map(|sig| {
            let signature = match &sig.data {
                SignatureData::Single { signature, .. } => signature.clone(),
                multi @ SignatureData::Multi { .. } => amino_multisignature(multi),
            };
            json!({
                "pub_key": sig.public_key.amino_json(),
                "signature": base64_encode(&signature),
            })
        })
        .collect::<Vec<_>>();

    let mut std_tx = json!({
        "msg": msgs,
        "fee": amino_fee(&tx.auth_info.fee),
        "signatures": signatures,
        "memo": tx.body.memo,
    });
    if tx.body.timeout_height != 0 {
        std_tx["timeout_height"] = Value::String(tx.body.timeout_height.to_string());
    }

    Ok(json!({
        "tx": std_tx,
        "mode": AMINO_BROADCAST_MODE,
    }))
}

/// Amino binary encoding of a multisignature: the bit array then each member signature.
pub fn amino_multisignature(data: &SignatureData) -> Vec<u8> {
    match data {
        SignatureData::Single { signature, .. } => signature.clone(),
        SignatureData::Multi {
            bitarray,
            signatures,
        } => {
            let mut out = vec![];
            let bits = amino_bitarray(bitarray);
            if !bits.is_empty() {
                out.push(0x0a);
                put_len_prefixed(&mut out, &bits);
            }
            for sig in signatures {
                out.push(0x12);
                put_len_prefixed(&mut out, &amino_multisignature(sig));
            }
            out
        }
    }
}

fn amino_bitarray(bits: &CompactBitArray) -> Vec<u8> {
    let mut out = vec![];
    if bits.extra_bits_stored != 0 {
        out.push(0x08);
        put_uvarint(&mut out, bits.extra_bits_stored as u64);
    }
    if !bits.elems.is_empty() {
        out.push(0x12);
        put_len_prefixed(&mut out, &bits.elems);
    }
    out
}

fn put_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    put_uvarint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}
