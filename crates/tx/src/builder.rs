use kestrel_primitives::{Error, Result};

use crate::{
    fee::GasFeeResolution,
    msgs::{Coin, CosmosMsg},
    options::TxOptions,
    tx::{AuthInfo, Fee, Tx, TxBody},
};

/// Assemble an unsigned draft. Pure: identical inputs give byte-identical drafts.
pub fn build(
    messages: Vec<CosmosMsg>,
    resolution: &GasFeeResolution,
    options: &TxOptions,
    denom: &str,
) -> Result<Tx> {
    if messages.is_empty() {
        return Err(Error::InsufficientParams("a transaction needs at least one message".into()));
    }

    Ok(Tx {
        body: TxBody {
            messages,
            memo: options.memo.clone(),
            timeout_height: options.timeout_height,
            ..Default::default()
        },
        auth_info: AuthInfo {
            signer_infos: vec![],
            fee: Fee {
                amount: vec![Coin::new(denom, resolution.fee_amount)],
                gas_limit: resolution.gas_limit,
                payer: String::new(),
                granter: options.fee_granter.clone().unwrap_or_default(),
            },
        },
        signatures: vec![],
    })
}

/// The draft a resolver simulates: messages and memo only.
pub fn draft_for_simulation(messages: &[CosmosMsg], options: &TxOptions) -> Tx {
    Tx {
        body: TxBody {
            messages: messages.to_vec(),
            memo: options.memo.clone(),
            timeout_height: options.timeout_height,
            ..Default::default()
        },
        ..Default::default()
    }
}
