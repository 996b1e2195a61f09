//! Raw EVM transactions: gas resolution, EIP-155 legacy signing and sender recovery.

pub mod gas;
pub mod msg;
pub mod recover;
pub mod remote;
pub mod signer;

pub use self::{
    gas::{parse_gas_price, resolve_gas_limit, EvmOptions},
    msg::{EvmMsg, EvmMsgKind},
    remote::{EstimateRequest, EvmQuery},
    signer::{create_and_sign, sender_address, sign_evm_tx, EvmTxJson, SignedEvmTx},
};

#[cfg(any(test, feature = "mock"))]
pub use self::remote::MockEvmQuery;
