use std::path::PathBuf;

use kestrel_primitives::{
    alloy_primitives::U256,
    consts::{DEFAULT_GAS_ADJUSTMENT, DEFAULT_GAS_PRICE},
    numeric::{parse_amount, parse_u64, GasAdjustment},
    PrivateKey, Result,
};
use serde::{Deserialize, Serialize};

use crate::sign_mode::SignMode;

/// Caller-owned knobs for a single build/sign call.
///
/// Numeric values stay strings until a build reads them so a malformed value surfaces as a
/// parse error from the operation that consumes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOptions {
    #[serde(skip)]
    pub private_key: Option<PrivateKey>,
    pub account_number: Option<u64>,
    pub sequence: Option<u64>,
    pub gas_limit: Option<String>,
    pub gas_price: String,
    pub gas_adjustment: String,
    pub fee_amount: Option<String>,
    pub sign_mode: SignMode,
    pub fee_granter: Option<String>,
    pub timeout_height: u64,
    pub memo: String,
    pub chain_id: String,
    pub output_document: Option<PathBuf>,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            private_key: None,
            account_number: None,
            sequence: None,
            gas_limit: None,
            gas_price: DEFAULT_GAS_PRICE.to_string(),
            gas_adjustment: DEFAULT_GAS_ADJUSTMENT.to_string(),
            fee_amount: None,
            sign_mode: SignMode::default(),
            fee_granter: None,
            timeout_height: 0,
            memo: String::new(),
            chain_id: String::new(),
            output_document: None,
        }
    }
}

impl TxOptions {
    pub fn with_private_key(mut self, key: PrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn with_account(mut self, account_number: u64, sequence: u64) -> Self {
        self.account_number = Some(account_number);
        self.sequence = Some(sequence);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: impl Into<String>) -> Self {
        self.gas_limit = Some(gas_limit.into());
        self
    }

    pub fn with_gas_price(mut self, gas_price: impl Into<String>) -> Self {
        self.gas_price = gas_price.into();
        self
    }

    pub fn with_gas_adjustment(mut self, adjustment: impl Into<String>) -> Self {
        self.gas_adjustment = adjustment.into();
        self
    }

    pub fn with_fee_amount(mut self, fee: impl Into<String>) -> Self {
        self.fee_amount = Some(fee.into());
        self
    }

    pub fn with_sign_mode(mut self, mode: SignMode) -> Self {
        self.sign_mode = mode;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_output_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_document = Some(path.into());
        self
    }

    pub fn parsed_gas_limit(&self) -> Result<Option<u64>> {
        self.gas_limit
            .as_deref()
            .map(|limit| parse_u64("gas limit", limit))
            .transpose()
    }

    pub fn parsed_gas_price(&self) -> Result<U256> {
        parse_amount("gas price", &self.gas_price)
    }

    pub fn parsed_gas_adjustment(&self) -> Result<GasAdjustment> {
        self.gas_adjustment.parse()
    }

    pub fn parsed_fee_amount(&self) -> Result<Option<U256>> {
        self.fee_amount
            .as_deref()
            .map(|fee| parse_amount("fee amount", fee))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::ErrorKind;

    use super::*;

    #[test]
    fn defaults() {
        let opts = TxOptions::default();
        assert_eq!(opts.parsed_gas_price().unwrap(), U256::from(850_000_000_000u64));
        assert_eq!(opts.parsed_gas_adjustment().unwrap().to_string(), "1.75");
        assert_eq!(opts.parsed_gas_limit().unwrap(), None);
        assert_eq!(opts.sign_mode, SignMode::Direct);
    }

    #[test]
    fn yaml_overrides() {
        let opts: TxOptions =
            serde_yaml::from_str("gas_limit: \"300000\"\nmemo: hello\nsign_mode: SIGN_MODE_LEGACY_AMINO_JSON\n")
                .unwrap();
        assert_eq!(opts.parsed_gas_limit().unwrap(), Some(300_000));
        assert_eq!(opts.memo, "hello");
        assert_eq!(opts.sign_mode, SignMode::LegacyAminoJson);
        assert_eq!(opts.gas_price, DEFAULT_GAS_PRICE);
    }

    #[test]
    fn malformed_numbers_fail_on_read() {
        let opts = TxOptions::default()
            .with_gas_limit("12x")
            .with_gas_price("abc")
            .with_gas_adjustment("1,5");
        assert_eq!(opts.parsed_gas_limit().unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(opts.parsed_gas_price().unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(opts.parsed_gas_adjustment().unwrap_err().kind(), ErrorKind::Parse);
    }
}
