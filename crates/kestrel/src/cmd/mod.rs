pub mod decode;
pub mod encode;
pub mod evm_send;
pub mod multisign;
pub mod send;
pub mod sign;
pub mod validate_signatures;
