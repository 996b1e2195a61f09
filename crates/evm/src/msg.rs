use alloy_primitives::{Address, Bytes, TxKind, U256};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// The three raw EVM transaction shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvmMsg {
    /// Native value transfer.
    SendCoin { to: Address, amount: U256 },
    InvokeContract {
        contract: Address,
        calldata: Bytes,
        #[serde(default)]
        value: U256,
    },
    /// Contract creation; `bytecode` is the init code with constructor arguments appended.
    DeployContract {
        bytecode: Bytes,
        #[serde(default)]
        value: U256,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EvmMsgKind {
    SendCoin,
    InvokeContract,
    DeployContract,
}

impl EvmMsg {
    pub fn kind(&self) -> EvmMsgKind {
        match self {
            EvmMsg::SendCoin { .. } => EvmMsgKind::SendCoin,
            EvmMsg::InvokeContract { .. } => EvmMsgKind::InvokeContract,
            EvmMsg::DeployContract { .. } => EvmMsgKind::DeployContract,
        }
    }

    pub fn to(&self) -> TxKind {
        match self {
            EvmMsg::SendCoin { to, .. } => TxKind::Call(*to),
            EvmMsg::InvokeContract { contract, .. } => TxKind::Call(*contract),
            EvmMsg::DeployContract { .. } => TxKind::Create,
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            EvmMsg::SendCoin { amount, .. } => *amount,
            EvmMsg::InvokeContract { value, .. } | EvmMsg::DeployContract { value, .. } => *value,
        }
    }

    pub fn input(&self) -> Bytes {
        match self {
            EvmMsg::SendCoin { .. } => Bytes::new(),
            EvmMsg::InvokeContract { calldata, .. } => calldata.clone(),
            EvmMsg::DeployContract { bytecode, .. } => bytecode.clone(),
        }
    }
}
