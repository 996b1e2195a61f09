/// Gas limit used when none is given and no endpoint is configured for simulation.
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

pub const DEFAULT_GAS_PRICE: &str = "850000000000";

pub const DEFAULT_GAS_ADJUSTMENT: &str = "1.75";

/// Gas limit of a plain EVM value transfer.
pub const DEFAULT_EVM_GAS_LIMIT: u64 = 21_000;

pub const DEFAULT_ACCOUNT_NUMBER: u64 = 0;

pub const DEFAULT_SEQUENCE: u64 = 0;

pub const DEFAULT_DENOM: &str = "axpriv";

pub const DEFAULT_ACCOUNT_PREFIX: &str = "xpla";

/// Mode string of the legacy amino broadcast envelope. Consumers match it verbatim.
pub const AMINO_BROADCAST_MODE: &str = "block|sync|async";

pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
pub const ETH_SECP256K1_PUBKEY_TYPE_URL: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
pub const MULTISIG_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.multisig.LegacyAminoPubKey";

pub const SECP256K1_AMINO_NAME: &str = "tendermint/PubKeySecp256k1";
pub const ETH_SECP256K1_AMINO_NAME: &str = "ethermint/PubKeyEthSecp256k1";
pub const MULTISIG_AMINO_NAME: &str = "tendermint/PubKeyMultisigThreshold";
