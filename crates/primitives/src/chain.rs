use crate::error::{Error, Result};

/// Extract the EIP-155 chain id embedded in a Cosmos chain id of the form
/// `<name>_<evm-chain-id>-<revision>`.
pub fn evm_chain_id(chain_id: &str) -> Result<u64> {
    let (_, rest) = chain_id
        .split_once('_')
        .ok_or_else(|| Error::parse("evm chain id", format!("{chain_id:?} has no `_` separator")))?;
    let id = rest.split('-').next().unwrap_or(rest);

    id.parse::<u64>()
        .map_err(|e| Error::parse(format!("evm chain id of {chain_id:?}"), e))
}
