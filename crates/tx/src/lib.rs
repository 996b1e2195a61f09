//! Cosmos transaction assembly: message routing, gas and fee resolution, the unsigned draft,
//! two-pass signing, verification and the transport codecs.

pub mod bitarray;
pub mod builder;
pub mod codec;
pub mod fee;
pub mod msgs;
pub mod options;
pub mod pubkey;
pub mod remote;
pub mod sign_mode;
pub mod signer;
pub mod tx;
pub mod verify;

pub use self::{
    bitarray::CompactBitArray,
    fee::{GasFeeResolution, Simulation},
    msgs::{route, Coin, CosmosMsg},
    options::TxOptions,
    pubkey::{MultisigPubKey, TxPublicKey},
    remote::{AccountInfo, BroadcastMode, ChainQuery, TxResponse},
    sign_mode::{sign_bytes, SignMode, SignerData},
    signer::{sign_round, SignatureData, SignatureV2, SignerKey},
    tx::{AuthInfo, Fee, ModeInfo, SignerInfo, Tx, TxBody},
    verify::verify_signature,
};

#[cfg(any(test, feature = "mock"))]
pub use self::remote::MockChainQuery;
