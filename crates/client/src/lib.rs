//! The transaction client: one pipeline from caller options to signed bytes, with the
//! offline signing, multisig and validation flows and the node collaborators.

pub mod client;
pub mod config;
pub mod evm_rpc;
pub mod grpc;
pub mod lcd;
pub mod request;

pub use self::{
    client::TxClient,
    config::{ClientConfig, Endpoint},
    request::{
        BroadcastResult, SignTxMsg, SignedDocument, SignedTx, TxMultiSignMsg, TxRequest,
        ValidateSignaturesMsg,
    },
};
