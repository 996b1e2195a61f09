//! Threshold multisig aggregation over cosigner signature documents.

mod aggregator;

pub use self::aggregator::{AggregationState, MultisigAggregator};
