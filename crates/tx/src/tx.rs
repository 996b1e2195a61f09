//! Transaction model.
//!
//! [`Tx`] mirrors `cosmos.tx.v1beta1.Tx` and serializes to the protobuf JSON document used for
//! offline hand-off between invocations. Wire bytes are always the protobuf `TxRaw` encoding
//! produced by [`Tx::to_bytes`]; the JSON form is only a transport.

use cosmrs::proto::{
    cosmos::tx::v1beta1::{
        mode_info::{Multi as ProtoMulti, Single as ProtoSingle, Sum},
        AuthInfo as ProtoAuthInfo, Fee as ProtoFee, ModeInfo as ProtoModeInfo,
        SignerInfo as ProtoSignerInfo, TxBody as ProtoTxBody, TxRaw,
    },
    prost::Message,
};
use kestrel_primitives::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{base64::Base64, serde_as, DisplayFromStr};

use crate::{
    bitarray::CompactBitArray,
    msgs::{Coin, CosmosMsg},
    pubkey::TxPublicKey,
    sign_mode::SignMode,
};

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    #[serde_as(as = "Vec<Base64>")]
    #[serde(default)]
    pub signatures: Vec<Vec<u8>>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<CosmosMsg>,
    #[serde(default)]
    pub memo: String,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub timeout_height: u64,
    #[serde(default)]
    pub extension_options: Vec<Value>,
    #[serde(default)]
    pub non_critical_extension_options: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub public_key: Option<TxPublicKey>,
    pub mode_info: ModeInfo,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeInfo {
    Single {
        mode: SignMode,
    },
    Multi {
        bitarray: CompactBitArray,
        mode_infos: Vec<ModeInfo>,
    },
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
    #[serde(default)]
    pub payer: String,
    #[serde(default)]
    pub granter: String,
}

impl ModeInfo {
    pub fn single(mode: SignMode) -> Self {
        ModeInfo::Single { mode }
    }

    pub(crate) fn to_proto(&self) -> ProtoModeInfo {
        let sum = match self {
            ModeInfo::Single { mode } => Sum::Single(ProtoSingle {
                mode: mode.as_i32(),
            }),
            ModeInfo::Multi {
                bitarray,
                mode_infos,
            } => Sum::Multi(ProtoMulti {
                bitarray: Some(bitarray.to_proto()),
                mode_infos: mode_infos.iter().map(ModeInfo::to_proto).collect(),
            }),
        };
        ProtoModeInfo { sum: Some(sum) }
    }

    pub(crate) fn from_proto(proto: ProtoModeInfo) -> Result<Self> {
        match proto.sum {
            Some(Sum::Single(single)) => Ok(ModeInfo::Single {
                mode: SignMode::from_i32(single.mode)?,
            }),
            Some(Sum::Multi(multi)) => Ok(ModeInfo::Multi {
                bitarray: CompactBitArray::from_proto(multi.bitarray.unwrap_or_default())?,
                mode_infos: multi
                    .mode_infos
                    .into_iter()
                    .map(ModeInfo::from_proto)
                    .collect::<Result<_>>()?,
            }),
            None => Err(Error::parse("mode info", "missing sum")),
        }
    }
}

impl TxBody {
    pub(crate) fn to_proto(&self) -> Result<ProtoTxBody> {
        if !self.extension_options.is_empty() || !self.non_critical_extension_options.is_empty() {
            return Err(Error::parse("tx body", "extension options are not supported"));
        }
        Ok(ProtoTxBody {
            messages: self
                .messages
                .iter()
                .map(CosmosMsg::to_any)
                .collect::<Result<_>>()?,
            memo: self.memo.clone(),
            timeout_height: self.timeout_height,
            ..Default::default()
        })
    }

    pub(crate) fn from_proto(proto: ProtoTxBody) -> Result<Self> {
        if !proto.extension_options.is_empty() || !proto.non_critical_extension_options.is_empty() {
            return Err(Error::parse("tx body", "extension options are not supported"));
        }
        Ok(TxBody {
            messages: proto
                .messages
                .iter()
                .map(CosmosMsg::from_any)
                .collect::<Result<_>>()?,
            memo: proto.memo,
            timeout_height: proto.timeout_height,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        })
    }
}

impl Fee {
    fn to_proto(&self) -> ProtoFee {
        ProtoFee {
            amount: self.amount.iter().map(Coin::to_proto).collect(),
            gas_limit: self.gas_limit,
            payer: self.payer.clone(),
            granter: self.granter.clone(),
        }
    }

    fn from_proto(proto: ProtoFee) -> Self {
        Fee {
            amount: proto.amount.into_iter().map(Coin::from_proto).collect(),
            gas_limit: proto.gas_limit,
            payer: proto.payer,
            granter: proto.granter,
        }
    }
}

impl AuthInfo {
    pub(crate) fn to_proto(&self) -> ProtoAuthInfo {
        ProtoAuthInfo {
            signer_infos: self
                .signer_infos
                .iter()
                .map(|info| ProtoSignerInfo {
                    public_key: info.public_key.as_ref().map(TxPublicKey::to_any),
                    mode_info: Some(info.mode_info.to_proto()),
                    sequence: info.sequence,
                })
                .collect(),
            fee: Some(self.fee.to_proto()),
            ..Default::default()
        }
    }

    pub(crate) fn from_proto(proto: ProtoAuthInfo) -> Result<Self> {
        let signer_infos = proto
            .signer_infos
            .into_iter()
            .map(|info| {
                Ok(SignerInfo {
                    public_key: info.public_key.as_ref().map(TxPublicKey::from_any).transpose()?,
                    mode_info: ModeInfo::from_proto(
                        info.mode_info
                            .ok_or_else(|| Error::parse("signer info", "missing mode info"))?,
                    )?,
                    sequence: info.sequence,
                })
            })
            .collect::<Result<_>>()?;
        Ok(AuthInfo {
            signer_infos,
            fee: Fee::from_proto(proto.fee.unwrap_or_default()),
        })
    }
}

impl Tx {
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.body.to_proto()?.encode_to_vec())
    }

    pub fn auth_info_bytes(&self) -> Vec<u8> {
        self.auth_info.to_proto().encode_to_vec()
    }

    /// Protobuf `TxRaw` bytes, as broadcast.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(TxRaw {
            body_bytes: self.body_bytes()?,
            auth_info_bytes: self.auth_info_bytes(),
            signatures: self.signatures.clone(),
        }
        .encode_to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = TxRaw::decode(bytes).map_err(|e| Error::parse("tx bytes", e))?;
        let body = ProtoTxBody::decode(raw.body_bytes.as_slice())
            .map_err(|e| Error::parse("tx body", e))?;
        let auth_info = ProtoAuthInfo::decode(raw.auth_info_bytes.as_slice())
            .map_err(|e| Error::parse("tx auth info", e))?;
        Ok(Tx {
            body: TxBody::from_proto(body)?,
            auth_info: AuthInfo::from_proto(auth_info)?,
            signatures: raw.signatures,
        })
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::parse("tx document", e))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::parse("tx document", e))
    }

    /// Signer addresses in order of first declaration across messages.
    pub fn signers(&self) -> Result<Vec<String>> {
        let mut signers: Vec<String> = vec![];
        for msg in &self.body.messages {
            for signer in msg.signers()? {
                if !signers.contains(&signer) {
                    signers.push(signer);
                }
            }
        }
        Ok(signers)
    }

    /// A signed transaction carries one non-empty signature per signer info.
    pub fn is_signed(&self) -> bool {
        !self.auth_info.signer_infos.is_empty()
            && self.signatures.len() == self.auth_info.signer_infos.len()
            && self.signatures.iter().all(|sig| !sig.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{KeyAlgo, PrivateKey};

    use super::*;
    use crate::msgs::MsgSend;

    fn tx() -> Tx {
        let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[7u8; 32]).unwrap();
        let from = key.public_key().account_id("xpla").unwrap().to_string();
        Tx {
            body: TxBody {
                messages: vec![CosmosMsg::BankSend(MsgSend {
                    from_address: from.clone(),
                    to_address: from,
                    amount: vec![Coin::new("axpriv", 1)],
                })],
                memo: "memo".into(),
                timeout_height: 42,
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: vec![SignerInfo {
                    public_key: Some(key.public_key().into()),
                    mode_info: ModeInfo::single(SignMode::Direct),
                    sequence: 3,
                }],
                fee: Fee {
                    amount: vec![Coin::new("axpriv", 212_500_000_000_000_000u64)],
                    gas_limit: 250_000,
                    ..Default::default()
                },
            },
            signatures: vec![vec![1; 65]],
        }
    }

    #[test]
    fn wire_round_trip() {
        let tx = tx();
        let bytes = tx.to_bytes().unwrap();
        assert_eq!(Tx::from_bytes(&bytes).unwrap(), tx);
    }

    #[test]
    fn json_round_trip_and_shape() {
        let tx = tx();
        let json: Value = serde_json::from_slice(&tx.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["body"]["timeout_height"], "42");
        assert_eq!(json["auth_info"]["fee"]["gas_limit"], "250000");
        assert_eq!(json["auth_info"]["signer_infos"][0]["sequence"], "3");
        assert_eq!(
            json["auth_info"]["signer_infos"][0]["mode_info"]["single"]["mode"],
            "SIGN_MODE_DIRECT"
        );
        assert_eq!(json["body"]["messages"][0]["@type"], "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(Tx::from_json(json.to_string().as_bytes()).unwrap(), tx);
    }

    #[test]
    fn garbage_bytes_are_parse_errors() {
        let err = Tx::from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind(), kestrel_primitives::ErrorKind::Parse);
    }

    #[test]
    fn signers_are_deduplicated() {
        let mut tx = tx();
        tx.body.messages.push(tx.body.messages[0].clone());
        assert_eq!(tx.signers().unwrap().len(), 1);
    }
}
