//! Canonical signing payloads.

use cosmrs::proto::{cosmos::tx::v1beta1::SignDoc, prost::Message};
use kestrel_primitives::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};

use crate::{
    msgs::CosmosMsg,
    tx::{Fee, Tx},
};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum SignMode {
    #[default]
    #[serde(rename = "SIGN_MODE_DIRECT")]
    #[strum(serialize = "direct")]
    Direct,
    #[serde(rename = "SIGN_MODE_LEGACY_AMINO_JSON")]
    #[strum(serialize = "amino-json")]
    LegacyAminoJson,
}

impl SignMode {
    pub fn as_i32(self) -> i32 {
        match self {
            SignMode::Direct => 1,
            SignMode::LegacyAminoJson => 127,
        }
    }

    pub fn from_i32(mode: i32) -> Result<Self> {
        match mode {
            1 => Ok(SignMode::Direct),
            127 => Ok(SignMode::LegacyAminoJson),
            other => Err(Error::parse("sign mode", format!("unsupported sign mode {other}"))),
        }
    }
}

/// The triple bound into every signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerData {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// Bytes a signer signs for `tx` under `mode`.
pub fn sign_bytes(mode: SignMode, tx: &Tx, signer: &SignerData) -> Result<Vec<u8>> {
    match mode {
        SignMode::Direct => {
            let expected = tx.signers()?.len();
            let infos = &tx.auth_info.signer_infos;
            if infos.len() != expected || infos.iter().any(|info| info.public_key.is_none()) {
                return Err(Error::InvalidRequest(format!(
                    "direct sign bytes need {expected} populated signer infos, found {}",
                    infos.iter().filter(|info| info.public_key.is_some()).count()
                )));
            }
            Ok(SignDoc {
                body_bytes: tx.body_bytes()?,
                auth_info_bytes: tx.auth_info_bytes(),
                chain_id: signer.chain_id.clone(),
                account_number: signer.account_number,
            }
            .encode_to_vec())
        }
        SignMode::LegacyAminoJson => Ok(canonical_json(&std_sign_doc(tx, signer)?)),
    }
}

fn std_sign_doc(tx: &Tx, signer: &SignerData) -> Result<Value> {
    let msgs = tx
        .body
        .messages
        .iter()
        .map(CosmosMsg::amino_json)
        .collect::<Result<Vec<_>>>()?;
    let mut doc = json!({
        "account_number": signer.account_number.to_string(),
        "chain_id": signer.chain_id,
        "fee": amino_fee(&tx.auth_info.fee),
        "memo": tx.body.memo,
        "msgs": msgs,
        "sequence": signer.sequence.to_string(),
    });
    if tx.body.timeout_height != 0 {
        doc["timeout_height"] = Value::String(tx.body.timeout_height.to_string());
    }
    Ok(doc)
}

pub(crate) fn amino_fee(fee: &Fee) -> Value {
    let mut value = json!({
        "amount": fee.amount,
        "gas": fee.gas_limit.to_string(),
    });
    if !fee.payer.is_empty() {
        value["payer"] = Value::String(fee.payer.clone());
    }
    if !fee.granter.is_empty() {
        value["granter"] = Value::String(fee.granter.clone());
    }
    value
}

/// Compact JSON with object keys sorted and `<`, `>`, `&` escaped.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out.into_bytes()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&fields[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        other => out.push_str(&other.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    let quoted = Value::String(s.to_string()).to_string();
    for c in quoted.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            c => out.push(c),
        }
    }
}
