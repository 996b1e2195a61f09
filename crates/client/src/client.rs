use std::{path::Path, sync::Arc};

use kestrel_evm::{
    create_and_sign as create_and_sign_evm, parse_gas_price, EvmMsg, EvmOptions, EvmQuery,
};
use kestrel_keyring::Keyring;
use kestrel_multisig::MultisigAggregator;
use kestrel_primitives::{
    cancellable,
    chain::evm_chain_id,
    fs::{read_document, write_document},
    CancellationToken, Error, PrivateKey, Result,
};
use kestrel_tx::{
    builder,
    codec::{self, amino_broadcast_request, read_signatures, SignatureDocument, ValidationReport},
    fee::{self, Simulation},
    sign_round, AccountInfo, ChainQuery, CosmosMsg, SignMode, SignerData, SignerKey, Tx,
    TxOptions, TxPublicKey,
};
use tracing::{debug, info};

use crate::{
    config::{ClientConfig, Endpoint},
    evm_rpc::EvmRpcClient,
    grpc::GrpcClient,
    lcd::LcdClient,
    request::{
        BroadcastResult, SignTxMsg, SignedDocument, SignedTx, TxMultiSignMsg, TxRequest,
        ValidateSignaturesMsg,
    },
};

/// Builds, signs, validates and broadcasts transactions for one chain.
///
/// Every call works on its own draft. Remote calls race the client's cancellation token.
pub struct TxClient {
    config: ClientConfig,
    options: TxOptions,
    chain: Option<Arc<dyn ChainQuery>>,
    evm: Option<Arc<dyn EvmQuery>>,
    keyring: Option<Keyring>,
    cancel: CancellationToken,
}

impl TxClient {
    /// An offline client; attach collaborators with the `with_*` methods.
    pub fn new(config: ClientConfig, options: TxOptions) -> Self {
        Self {
            config,
            options,
            chain: None,
            evm: None,
            keyring: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A client wired to the endpoints named in `config`.
    pub async fn connect(config: ClientConfig, options: TxOptions) -> Result<Self> {
        let chain: Option<Arc<dyn ChainQuery>> = match config.endpoint() {
            Endpoint::Grpc(url) => Some(Arc::new(GrpcClient::new(&url))),
            Endpoint::Lcd(url) => Some(Arc::new(LcdClient::new(url))),
            Endpoint::Offline => None,
        };
        let evm: Option<Arc<dyn EvmQuery>> = match &config.evm_rpc_url {
            Some(url) => Some(Arc::new(EvmRpcClient::connect(url).await?)),
            None => None,
        };
        debug!(
            endpoint = ?config.endpoint(),
            evm = evm.is_some(),
            "Connected tx client"
        );

        let mut client = Self::new(config, options);
        client.chain = chain;
        client.evm = evm;
        Ok(client)
    }

    pub fn with_chain_query(mut self, chain: Arc<dyn ChainQuery>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_evm_query(mut self, evm: Arc<dyn EvmQuery>) -> Self {
        self.evm = Some(evm);
        self
    }

    pub fn with_keyring(mut self, keyring: Keyring) -> Self {
        self.keyring = Some(keyring);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn options(&self) -> &TxOptions {
        &self.options
    }

    fn chain_id(&self) -> &str {
        if self.options.chain_id.is_empty() {
            &self.config.chain_id
        } else {
            &self.options.chain_id
        }
    }

    fn private_key(&self) -> Result<&PrivateKey> {
        self.options
            .private_key
            .as_ref()
            .ok_or_else(|| Error::InsufficientParams("no private key configured".into()))
    }

    fn address_of(&self, key: &TxPublicKey) -> Result<String> {
        Ok(key.account_id(&self.config.account_prefix)?.to_string())
    }

    /// Explicit account number and sequence win, then the chain, then `0/0`.
    async fn resolve_account(&self, address: &str, offline: bool) -> Result<AccountInfo> {
        let explicit = (self.options.account_number, self.options.sequence);
        let info = match (explicit, self.chain.as_deref()) {
            ((Some(account_number), Some(sequence)), _) => AccountInfo {
                account_number,
                sequence,
            },
            ((account_number, sequence), Some(chain)) if !offline => {
                let remote = cancellable(&self.cancel, chain.account(address)).await?;
                AccountInfo {
                    account_number: account_number.unwrap_or(remote.account_number),
                    sequence: sequence.unwrap_or(remote.sequence),
                }
            }
            ((account_number, sequence), _) => AccountInfo {
                account_number: account_number.unwrap_or_default(),
                sequence: sequence.unwrap_or_default(),
            },
        };
        debug!(
            address,
            account_number = info.account_number,
            sequence = info.sequence,
            "Resolved account"
        );
        Ok(info)
    }

    /// Persist `bytes` when an output document is configured; a failed write fails the call.
    fn write_output(&self, path: Option<&Path>, bytes: &[u8]) -> Result<()> {
        if let Some(path) = path.or(self.options.output_document.as_deref()) {
            write_document(path, bytes)?;
            info!(path = %path.display(), "Wrote output document");
        }
        Ok(())
    }

    /// Build and sign with the configured key.
    pub async fn create_and_sign(&self, request: TxRequest) -> Result<SignedTx> {
        let signed = match request {
            TxRequest::Structured(messages) => {
                SignedTx::Structured(self.create_and_sign_structured(messages).await?)
            }
            TxRequest::RawEvm(msg) => self.create_and_sign_evm(msg).await?,
        };
        self.write_output(None, &signed.to_json_pretty()?)?;
        Ok(signed)
    }

    async fn create_and_sign_structured(&self, messages: Vec<CosmosMsg>) -> Result<Tx> {
        let key = self.private_key()?;
        let public_key = TxPublicKey::from(key.public_key());
        let address = self.address_of(&public_key)?;
        let account = self.resolve_account(&address, false).await?;

        let mut tx = self.build(messages, Some(public_key), account.sequence).await?;
        let signer = SignerKey {
            key,
            data: SignerData {
                chain_id: self.chain_id().to_string(),
                account_number: account.account_number,
                sequence: account.sequence,
            },
        };
        sign_round(&mut tx, &[signer], self.options.sign_mode, true)?;
        info!(%address, mode = %self.options.sign_mode, "Signed transaction");
        Ok(tx)
    }

    async fn create_and_sign_evm(&self, msg: EvmMsg) -> Result<SignedTx> {
        let key = self.private_key()?;
        let address = self.address_of(&key.public_key().into())?;
        let account = self.resolve_account(&address, false).await?;

        let mut options = EvmOptions::new(evm_chain_id(self.chain_id())?, account.sequence)
            .with_gas_price(parse_gas_price(&self.options.gas_price)?)
            .with_gas_adjustment(self.options.parsed_gas_adjustment()?);
        if let Some(gas_limit) = self.options.parsed_gas_limit()? {
            options = options.with_gas_limit(gas_limit);
        }
        let signed =
            create_and_sign_evm(&msg, &options, key, self.evm.as_deref(), &self.cancel).await?;
        Ok(SignedTx::RawEvm(signed))
    }

    async fn build(
        &self,
        messages: Vec<CosmosMsg>,
        public_key: Option<TxPublicKey>,
        sequence: u64,
    ) -> Result<Tx> {
        let draft = builder::draft_for_simulation(&messages, &self.options);
        let simulation = self.chain.as_deref().map(|chain| Simulation {
            chain,
            public_key,
            sequence,
        });
        let resolution = fee::resolve(&self.options, &draft, simulation, &self.cancel).await?;
        builder::build(messages, &resolution, &self.options, &self.config.denom)
    }

    /// Build a draft without signatures for a later offline signing round.
    pub async fn create_unsigned_tx(&self, messages: Vec<CosmosMsg>) -> Result<Tx> {
        let public_key = self.options.private_key.as_ref().map(|k| k.public_key().into());
        let sequence = match messages.first().map(CosmosMsg::signers).transpose()? {
            Some(signers) if !signers.is_empty() => {
                self.resolve_account(&signers[0], false).await?.sequence
            }
            _ => self.options.sequence.unwrap_or_default(),
        };

        let tx = self.build(messages, public_key, sequence).await?;
        info!(messages = tx.body.messages.len(), "Created unsigned transaction");
        self.write_output(None, &tx.to_json_pretty()?)?;
        Ok(tx)
    }

    /// Sign a stored draft with the configured key.
    pub async fn sign_tx(&self, msg: SignTxMsg) -> Result<SignedDocument> {
        let key = self.private_key()?;
        let mut tx = Tx::from_json(&read_document(&msg.unsigned_file)?)?;
        let address = self.address_of(&key.public_key().into())?;
        if let Some(from) = &msg.from_address {
            if from != &address {
                return Err(Error::InvalidRequest(format!(
                    "from address {from} does not match the signing key {address}"
                )));
            }
        }

        let signers = tx.signers()?;
        let (account_address, mode, signature_only) = match &msg.multisig_address {
            Some(multisig) => {
                if !signers.contains(multisig) {
                    return Err(Error::SignatureMismatch(format!(
                        "multisig {multisig} is not a signer of the transaction"
                    )));
                }
                (multisig.clone(), SignMode::LegacyAminoJson, true)
            }
            None => {
                if !signers.contains(&address) {
                    return Err(Error::SignatureMismatch(format!(
                        "{address} is not a signer of the transaction"
                    )));
                }
                let mode = if msg.amino {
                    SignMode::LegacyAminoJson
                } else {
                    self.options.sign_mode
                };
                (address.clone(), mode, msg.signature_only)
            }
        };

        let account = self.resolve_account(&account_address, msg.offline).await?;
        let signer = SignerKey {
            key,
            data: SignerData {
                chain_id: self.chain_id().to_string(),
                account_number: account.account_number,
                sequence: account.sequence,
            },
        };
        let overwrite = msg.overwrite || msg.multisig_address.is_some();
        let signatures = sign_round(&mut tx, &[signer], mode, overwrite)?;
        info!(signer = %address, account = %account_address, %mode, "Signed stored transaction");

        let doc = if signature_only {
            SignedDocument::Signatures(SignatureDocument { signatures })
        } else {
            SignedDocument::Tx(tx)
        };
        self.write_output(None, &doc.to_json_pretty()?)?;
        Ok(doc)
    }

    /// Aggregate cosigner signature files into the keyring multisig's composite signature.
    pub async fn multi_sign(&self, msg: TxMultiSignMsg) -> Result<SignedDocument> {
        let keyring = self
            .keyring
            .as_ref()
            .ok_or_else(|| Error::InsufficientParams("no keyring configured".into()))?;
        let multisig = keyring.get(&msg.from_name)?.multisig_key()?;
        let address = self.address_of(&multisig.clone().into())?;

        let tx = Tx::from_json(&read_document(&msg.file)?)?;
        let account = self.resolve_account(&address, msg.offline).await?;
        let signer = SignerData {
            chain_id: self.chain_id().to_string(),
            account_number: account.account_number,
            sequence: account.sequence,
        };

        let mut aggregator = MultisigAggregator::new(multisig, tx, signer)
            .with_account_prefix(self.config.account_prefix.clone());
        for path in &msg.signature_files {
            let signatures = read_signatures(&read_document(path)?)?;
            debug!(path = %path.display(), signatures = signatures.len(), "Read cosigner signatures");
            aggregator.collect(signatures)?;
        }
        let tx = aggregator.into_signed_tx()?;
        info!(multisig = %address, "Aggregated multisig transaction");

        let doc = if msg.signature_only {
            SignedDocument::Signatures(SignatureDocument::from_tx(&tx)?)
        } else if msg.amino {
            SignedDocument::Amino(amino_broadcast_request(&tx)?)
        } else {
            SignedDocument::Tx(tx)
        };
        self.write_output(msg.output_document.as_deref(), &doc.to_json_pretty()?)?;
        Ok(doc)
    }

    /// Per-signer validation of a stored transaction.
    pub async fn validate_signatures(&self, msg: ValidateSignaturesMsg) -> Result<ValidationReport> {
        let tx = Tx::from_json(&read_document(&msg.file)?)?;
        let chain_id = msg.chain_id.as_deref().unwrap_or_else(|| self.chain_id());

        let account_numbers = match self.chain.as_deref() {
            Some(chain) if !msg.offline => {
                let mut numbers = vec![];
                for signer in tx.signers()? {
                    let info = cancellable(&self.cancel, chain.account(&signer)).await?;
                    numbers.push(info.account_number);
                }
                Some(numbers)
            }
            _ => None,
        };

        let report = codec::validate_signatures(
            &tx,
            chain_id,
            &self.config.account_prefix,
            account_numbers.as_deref(),
        )?;
        info!(success = report.success, "Validated signatures");
        Ok(report)
    }

    /// Standard base64 of the wire bytes of a stored transaction.
    pub fn encode_tx(&self, file: &Path) -> Result<String> {
        codec::encode_tx(&Tx::from_json(&read_document(file)?)?)
    }

    pub fn decode_tx(&self, encoded: &str) -> Result<Tx> {
        codec::decode_tx(encoded.trim())
    }

    pub async fn broadcast(&self, signed: &SignedTx) -> Result<BroadcastResult> {
        match signed {
            SignedTx::Structured(tx) => {
                let chain = self.chain.as_deref().ok_or_else(|| {
                    Error::InsufficientParams("broadcast needs an lcd or grpc endpoint".into())
                })?;
                let mode = self.config.broadcast_mode;
                let response =
                    cancellable(&self.cancel, chain.broadcast(tx.to_bytes()?, mode)).await?;
                info!(txhash = %response.txhash, code = response.code, %mode, "Broadcast transaction");
                Ok(BroadcastResult::Cosmos(response))
            }
            SignedTx::RawEvm(tx) => {
                let evm = self.evm.as_deref().ok_or_else(|| {
                    Error::InsufficientParams("broadcast needs an evm rpc endpoint".into())
                })?;
                let hash = cancellable(&self.cancel, evm.send_raw_transaction(tx.raw())).await?;
                info!(%hash, "Broadcast evm transaction");
                Ok(BroadcastResult::Evm(hash))
            }
        }
    }
}
