use kestrel_primitives::{consts::DEFAULT_ACCOUNT_PREFIX, Error, Result};
use kestrel_tx::{
    verify_signature, CompactBitArray, MultisigPubKey, SignatureData, SignatureV2, SignerData,
    Tx, TxPublicKey,
};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AggregationState {
    Collecting,
    Verifying,
    Aggregated,
    Rejected,
}

/// Folds cosigner signatures over one shared draft into a threshold multisignature.
///
/// Signatures are collected in any order. Aggregation verifies every collected signature
/// before counting; a single non-member or failing signature rejects the whole round.
pub struct MultisigAggregator {
    multisig: MultisigPubKey,
    tx: Tx,
    signer: SignerData,
    prefix: String,
    collected: Vec<SignatureV2>,
    state: AggregationState,
}

impl MultisigAggregator {
    pub fn new(multisig: MultisigPubKey, tx: Tx, signer: SignerData) -> Self {
        Self {
            multisig,
            tx,
            signer,
            prefix: DEFAULT_ACCOUNT_PREFIX.to_string(),
            collected: vec![],
            state: AggregationState::Collecting,
        }
    }

    /// Bech32 prefix used when naming signers in errors.
    pub fn with_account_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn state(&self) -> AggregationState {
        self.state
    }

    pub fn collected(&self) -> usize {
        self.collected.len()
    }

    /// Add signatures read from one cosigner document. A later signature from the same key
    /// replaces the earlier one.
    pub fn collect(&mut self, signatures: impl IntoIterator<Item = SignatureV2>) -> Result<()> {
        if self.state != AggregationState::Collecting {
            return Err(Error::InvalidRequest(format!(
                "cannot collect signatures once {}",
                self.state
            )));
        }
        for sig in signatures {
            match self
                .collected
                .iter()
                .position(|existing| existing.public_key == sig.public_key)
            {
                Some(index) => {
                    debug!(signer = %self.name(&sig.public_key), "Replacing duplicate signature");
                    self.collected[index] = sig;
                }
                None => self.collected.push(sig),
            }
        }
        Ok(())
    }

    /// Verify, count and fold. On success the composite signature is returned and the
    /// aggregator is `Aggregated`; any failure leaves it `Rejected`.
    pub fn aggregate(&mut self) -> Result<SignatureV2> {
        if self.state != AggregationState::Collecting {
            return Err(Error::InvalidRequest(format!("aggregation already {}", self.state)));
        }
        self.state = AggregationState::Verifying;
        debug!(collected = self.collected.len(), "Verifying cosigner signatures");

        match self.verify_and_fold() {
            Ok(sig) => {
                self.state = AggregationState::Aggregated;
                info!(
                    signatures = self.collected.len(),
                    threshold = self.multisig.threshold(),
                    "Aggregated multisig signature"
                );
                Ok(sig)
            }
            Err(e) => {
                self.state = AggregationState::Rejected;
                warn!(error = %e, "Rejected multisig aggregation");
                Err(e)
            }
        }
    }

    fn verify_and_fold(&self) -> Result<SignatureV2> {
        let members = self.multisig.members().len();
        let mut slots: Vec<Option<SignatureData>> = vec![None; members];

        for sig in &self.collected {
            let index = self
                .multisig
                .position(&sig.public_key.address())
                .filter(|_| matches!(sig.public_key, TxPublicKey::Single(_)))
                .ok_or_else(|| {
                    Error::SignatureMismatch(format!(
                        "signer {} is not a member of multisig {}",
                        self.name(&sig.public_key),
                        self.name(&self.multisig.clone().into())
                    ))
                })?;

            verify_signature(&self.tx, sig, &self.signer).map_err(|e| match e {
                Error::SignatureInvalid(reason) => Error::SignatureInvalid(format!(
                    "signer {}: {reason}",
                    self.name(&sig.public_key)
                )),
                other => other,
            })?;
            slots[index] = Some(sig.data.clone());
        }

        let have = slots.iter().flatten().count();
        let threshold = self.multisig.threshold() as usize;
        if have < threshold {
            return Err(Error::InsufficientSignatures { have, threshold });
        }

        let mut bitarray = CompactBitArray::new(members);
        let mut signatures = Vec::with_capacity(have);
        for (index, slot) in slots.into_iter().enumerate() {
            if let Some(data) = slot {
                bitarray.set(index, true)?;
                signatures.push(data);
            }
        }

        Ok(SignatureV2 {
            public_key: self.multisig.clone().into(),
            data: SignatureData::Multi {
                bitarray,
                signatures,
            },
            sequence: self.signer.sequence,
        })
    }

    /// Aggregate and install the composite signature as the draft's sole signer.
    pub fn into_signed_tx(mut self) -> Result<Tx> {
        let sig = self.aggregate()?;
        let mut tx = self.tx;
        tx.set_signatures(vec![sig]);
        Ok(tx)
    }

    fn name(&self, key: &TxPublicKey) -> String {
        key.account_id(&self.prefix)
            .map(|id| id.to_string())
            .unwrap_or_else(|_| format!("0x{}", hex::encode(key.address())))
    }
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{ErrorKind, KeyAlgo, PrivateKey};
    use kestrel_tx::{
        msgs::MsgSend, sign_round, Coin, CosmosMsg, SignMode, SignerKey, TxBody,
    };

    use super::*;

    struct Fixture {
        keys: Vec<PrivateKey>,
        multisig: MultisigPubKey,
        tx: Tx,
        signer: SignerData,
    }

    fn fixture(threshold: u32, members: u8) -> Fixture {
        let keys: Vec<_> = (1..=members)
            .map(|seed| PrivateKey::from_slice(KeyAlgo::Secp256k1, &[seed; 32]).unwrap())
            .collect();
        let multisig =
            MultisigPubKey::new(threshold, keys.iter().map(|k| k.public_key()).collect()).unwrap();
        let from = TxPublicKey::from(multisig.clone())
            .account_id("xpla")
            .unwrap()
            .to_string();
        let tx = Tx {
            body: TxBody {
                messages: vec![CosmosMsg::BankSend(MsgSend {
                    from_address: from.clone(),
                    to_address: from,
                    amount: vec![Coin::new("axpriv", 10)],
                })],
                ..Default::default()
            },
            ..Default::default()
        };
        Fixture {
            keys,
            multisig,
            tx,
            signer: SignerData {
                chain_id: "cube_47-5".into(),
                account_number: 4,
                sequence: 2,
            },
        }
    }

    fn cosign(f: &Fixture, key: &PrivateKey) -> SignatureV2 {
        let mut tx = f.tx.clone();
        let signer = SignerKey {
            key,
            data: f.signer.clone(),
        };
        sign_round(&mut tx, &[signer], SignMode::LegacyAminoJson, true)
            .unwrap()
            .remove(0)
    }

    fn aggregator(f: &Fixture) -> MultisigAggregator {
        MultisigAggregator::new(f.multisig.clone(), f.tx.clone(), f.signer.clone())
    }

    #[test]
    fn threshold_met_in_member_order() {
        let f = fixture(2, 3);
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[2]), cosign(&f, &f.keys[0])]).unwrap();
        let sig = agg.aggregate().unwrap();
        assert_eq!(agg.state(), AggregationState::Aggregated);

        let SignatureData::Multi {
            bitarray,
            signatures,
        } = &sig.data
        else {
            panic!("expected multi signature data");
        };
        assert_eq!(bitarray.ones().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(signatures[0], cosign(&f, &f.keys[0]).data);
        assert_eq!(signatures[1], cosign(&f, &f.keys[2]).data);

        let mut tx = f.tx.clone();
        tx.set_signatures(vec![sig.clone()]);
        verify_signature(&tx, &sig, &f.signer).unwrap();
    }

    #[test]
    fn one_short_of_threshold() {
        let f = fixture(2, 3);
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[1])]).unwrap();
        let err = agg.aggregate().unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSignatures {
                have: 1,
                threshold: 2
            }
        ));
        assert_eq!(agg.state(), AggregationState::Rejected);
    }

    #[test]
    fn one_bad_signature_rejects_the_round() {
        let f = fixture(2, 3);
        let mut bad = cosign(&f, &f.keys[1]);
        if let SignatureData::Single { signature, .. } = &mut bad.data {
            signature[10] ^= 0xff;
        }
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[0]), bad, cosign(&f, &f.keys[2])])
            .unwrap();
        let err = agg.aggregate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
        assert_eq!(agg.state(), AggregationState::Rejected);
    }

    #[test]
    fn outsider_is_named() {
        let f = fixture(1, 2);
        let outsider = PrivateKey::from_slice(KeyAlgo::Secp256k1, &[9u8; 32]).unwrap();
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[0]), cosign(&f, &outsider)])
            .unwrap();
        let err = agg.aggregate().unwrap_err();
        let expected = outsider.public_key().account_id("xpla").unwrap().to_string();
        assert!(matches!(err, Error::SignatureMismatch(ref msg) if msg.contains(&expected)));
    }

    #[test]
    fn duplicates_are_replaced() {
        let f = fixture(2, 2);
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[0])]).unwrap();
        agg.collect([cosign(&f, &f.keys[0]), cosign(&f, &f.keys[1])])
            .unwrap();
        assert_eq!(agg.collected(), 2);
        let tx = agg.into_signed_tx().unwrap();
        assert_eq!(tx.auth_info.signer_infos.len(), 1);
        assert!(tx.is_signed());
    }

    #[test]
    fn no_collecting_after_aggregation() {
        let f = fixture(1, 1);
        let mut agg = aggregator(&f);
        agg.collect([cosign(&f, &f.keys[0])]).unwrap();
        agg.aggregate().unwrap();
        assert!(agg.collect([cosign(&f, &f.keys[0])]).is_err());
        assert!(agg.aggregate().is_err());
    }
}
