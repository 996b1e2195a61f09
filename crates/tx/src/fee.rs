//! Gas limit and fee amount resolution.

use kestrel_primitives::{
    alloy_primitives::U256, cancellable, consts::DEFAULT_GAS_LIMIT, numeric::fee_amount,
    CancellationToken, Result,
};
use tracing::debug;

use crate::{
    options::TxOptions,
    pubkey::TxPublicKey,
    remote::ChainQuery,
    tx::{ModeInfo, SignerInfo, Tx},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasFeeResolution {
    pub gas_limit: u64,
    pub fee_amount: U256,
}

/// What a simulation needs besides the draft: the node and the simulating signer's slot.
pub struct Simulation<'a> {
    pub chain: &'a dyn ChainQuery,
    pub public_key: Option<TxPublicKey>,
    pub sequence: u64,
}

/// Resolve `(gas limit, fee amount)` for `draft`.
///
/// An explicit gas limit wins. Without one, the default applies when no node is reachable
/// (`simulation` is `None`), otherwise the simulated gas is scaled by the gas adjustment and
/// rounded up. A failed simulation is returned, never defaulted. The fee is `gas_limit *
/// gas_price` unless given explicitly.
pub async fn resolve(
    options: &TxOptions,
    draft: &Tx,
    simulation: Option<Simulation<'_>>,
    cancel: &CancellationToken,
) -> Result<GasFeeResolution> {
    let gas_limit = match (options.parsed_gas_limit()?, simulation) {
        (Some(explicit), _) => explicit,
        (None, None) => {
            debug!(gas_limit = DEFAULT_GAS_LIMIT, "No endpoint configured, using default gas limit");
            DEFAULT_GAS_LIMIT
        }
        (None, Some(simulation)) => {
            let adjustment = options.parsed_gas_adjustment()?;
            let bytes = simulation_bytes(draft, &simulation, options)?;
            let gas_used = cancellable(cancel, simulation.chain.simulate(bytes)).await?;
            let adjusted = adjustment.apply(gas_used)?;
            debug!(gas_used, %adjustment, gas_limit = adjusted, "Simulated gas");
            adjusted
        }
    };

    let fee_amount = match options.parsed_fee_amount()? {
        Some(explicit) => explicit,
        None => fee_amount(gas_limit, options.parsed_gas_price()?)?,
    };
    debug!(gas_limit, %fee_amount, "Resolved fee");

    Ok(GasFeeResolution {
        gas_limit,
        fee_amount,
    })
}

/// The draft with one placeholder signer slot, as a node expects to simulate it.
fn simulation_bytes(draft: &Tx, simulation: &Simulation<'_>, options: &TxOptions) -> Result<Vec<u8>> {
    let mut tx = draft.clone();
    if let Some(public_key) = &simulation.public_key {
        tx.auth_info.signer_infos = vec![SignerInfo {
            public_key: Some(public_key.clone()),
            mode_info: ModeInfo::single(options.sign_mode),
            sequence: simulation.sequence,
        }];
        tx.signatures = vec![vec![]];
    }
    tx.to_bytes()
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{Error, ErrorKind, KeyAlgo, PrivateKey};

    use super::*;
    use crate::remote::MockChainQuery;

    fn draft() -> Tx {
        Tx::default()
    }

    fn public_key() -> TxPublicKey {
        PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[5u8; 32])
            .unwrap()
            .public_key()
            .into()
    }

    #[tokio::test]
    async fn offline_uses_default_and_exact_fee() {
        let options = TxOptions::default().with_gas_adjustment("1.0");
        let res = resolve(&options, &draft(), None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(res.gas_limit, 250_000);
        assert_eq!(res.fee_amount.to_string(), "212500000000000000");
    }

    #[tokio::test]
    async fn explicit_values_win() {
        let mut chain = MockChainQuery::new();
        chain.expect_simulate().never();
        let options = TxOptions::default()
            .with_gas_limit("100")
            .with_fee_amount("7axpriv");
        let simulation = Simulation {
            chain: &chain,
            public_key: None,
            sequence: 0,
        };
        let res = resolve(&options, &draft(), Some(simulation), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(res.gas_limit, 100);
        assert_eq!(res.fee_amount, U256::from(7));
    }

    #[tokio::test]
    async fn simulated_gas_is_adjusted_up() {
        let mut chain = MockChainQuery::new();
        chain
            .expect_simulate()
            .withf(|bytes| Tx::from_bytes(bytes).map(|tx| tx.signatures.len() == 1).unwrap_or(false))
            .times(1)
            .returning(|_| Ok(100_001));
        let options = TxOptions::default().with_gas_adjustment("1.5").with_gas_price("2");
        let simulation = Simulation {
            chain: &chain,
            public_key: Some(public_key()),
            sequence: 9,
        };
        let res = resolve(&options, &draft(), Some(simulation), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(res.gas_limit, 150_002);
        assert_eq!(res.fee_amount, U256::from(300_004));
    }

    #[tokio::test]
    async fn simulate_failure_is_remote_error() {
        let mut chain = MockChainQuery::new();
        chain
            .expect_simulate()
            .returning(|_| Err(Error::remote("simulate", "connection refused")));
        let simulation = Simulation {
            chain: &chain,
            public_key: None,
            sequence: 0,
        };
        let err = resolve(
            &TxOptions::default(),
            &draft(),
            Some(simulation),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRequest);
    }

    #[tokio::test]
    async fn malformed_price_is_parse_error() {
        let options = TxOptions::default().with_gas_price("lots");
        let err = resolve(&options, &draft(), None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn cancelled_simulation() {
        let mut chain = MockChainQuery::new();
        chain.expect_simulate().returning(|_| Ok(1));
        let token = CancellationToken::new();
        token.cancel();
        let simulation = Simulation {
            chain: &chain,
            public_key: None,
            sequence: 0,
        };
        let err = resolve(&TxOptions::default(), &draft(), Some(simulation), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
