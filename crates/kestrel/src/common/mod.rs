use std::path::{Path, PathBuf};

use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::{ClientConfig, TxClient};
use kestrel_keyring::{Keyring, KEYRING_FILENAME};
use kestrel_primitives::{KeyAlgo, PrivateKey};
use kestrel_tx::{SignMode, TxOptions};
use tracing::debug;

use consts::{DEFAULT_CONFIG_FILENAME, DEFAULT_ROOT_DIR};

pub mod consts;

#[derive(Debug, Parser, Clone)]
pub struct DatadirCliArgs {
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Directory holding the keyring and the default config. Defaults to ~/.kestrel."
    )]
    data_dir: Option<PathBuf>,
}

impl DatadirCliArgs {
    pub fn get_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(DEFAULT_ROOT_DIR))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}

/// What every command shares: the loaded client config and the data directory.
#[derive(Clone, Debug)]
pub struct CliEnv {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl CliEnv {
    /// Load `config`, or `{data_dir}/config.yml` when present, or the defaults.
    pub fn load(config: Option<&Path>, data_dir: PathBuf) -> eyre::Result<Self> {
        let default_path = data_dir.join(DEFAULT_CONFIG_FILENAME);
        let config = match config {
            Some(path) => ClientConfig::load(path)?,
            None if default_path.exists() => ClientConfig::load(&default_path)?,
            None => ClientConfig::default(),
        };
        debug!(data_dir = %data_dir.display(), chain_id = %config.chain_id, "Loaded config");
        Ok(Self { config, data_dir })
    }

    /// The keyring in the data directory; empty when none was saved yet.
    pub fn keyring(&self) -> eyre::Result<Keyring> {
        if self.data_dir.join(KEYRING_FILENAME).exists() {
            Ok(Keyring::open(&self.data_dir)?)
        } else {
            Ok(Keyring::default())
        }
    }

    /// A client bound to the interrupt token; offline clients never open a connection.
    pub async fn client(
        &self,
        ctx: &CliContext,
        options: TxOptions,
        offline: bool,
    ) -> eyre::Result<TxClient> {
        let client = if offline {
            TxClient::new(self.config.clone(), options)
        } else {
            TxClient::connect(self.config.clone(), options).await?
        };
        Ok(client.with_cancellation(ctx.cancel.clone()))
    }
}

#[derive(Debug, Parser, Clone, Default)]
pub struct KeyCliArgs {
    #[arg(
        long,
        value_name = "NAME",
        conflicts_with = "private_key_file",
        help = "Sign with this keyring key."
    )]
    from: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Sign with the hex private key in this file."
    )]
    private_key_file: Option<PathBuf>,
}

impl KeyCliArgs {
    pub fn private_key(&self, env: &CliEnv) -> eyre::Result<Option<PrivateKey>> {
        if let Some(name) = &self.from {
            return Ok(Some(env.keyring()?.get(name)?.private_key()?));
        }
        match &self.private_key_file {
            Some(path) => Ok(Some(read_private_key(path, env.config.key_algo)?)),
            None => Ok(None),
        }
    }
}

fn read_private_key(path: &Path, algo: KeyAlgo) -> eyre::Result<PrivateKey> {
    let secret = kestrel_keyring::read_secret_string(path)
        .map_err(|e| eyre::eyre!("private key file {}: {e}", path.display()))?;
    Ok(PrivateKey::from_hex(algo, secret.as_str())?)
}

#[derive(Debug, Parser, Clone, Default)]
pub struct TxCliArgs {
    #[arg(long, value_name = "CHAIN_ID", help = "Overrides the configured chain id.")]
    pub chain_id: Option<String>,

    #[arg(long, requires = "sequence", help = "Skip the account lookup.")]
    pub account_number: Option<u64>,

    #[arg(long, help = "Account sequence, or the EVM nonce.")]
    pub sequence: Option<u64>,

    #[arg(long, help = "Gas limit. Simulated or defaulted when absent.")]
    pub gas_limit: Option<String>,

    #[arg(long, help = "Gas price, with or without the denomination.")]
    pub gas_price: Option<String>,

    #[arg(long, help = "Multiplier applied to simulated gas.")]
    pub gas_adjustment: Option<String>,

    #[arg(long, value_name = "AMOUNT", help = "Fixed fee amount in the configured denomination.")]
    pub fees: Option<String>,

    #[arg(long, value_name = "MODE", help = "direct or amino-json.")]
    pub sign_mode: Option<SignMode>,

    #[arg(long, default_value = "")]
    pub memo: String,

    #[arg(long, value_name = "PATH", help = "Also write the resulting document here.")]
    pub output_document: Option<PathBuf>,

    #[arg(long, help = "Never contact a node.")]
    pub offline: bool,
}

impl TxCliArgs {
    pub fn options(&self, key: Option<PrivateKey>) -> TxOptions {
        let defaults = TxOptions::default();
        TxOptions {
            private_key: key,
            account_number: self.account_number,
            sequence: self.sequence,
            gas_limit: self.gas_limit.clone(),
            gas_price: self.gas_price.clone().unwrap_or(defaults.gas_price),
            gas_adjustment: self
                .gas_adjustment
                .clone()
                .unwrap_or(defaults.gas_adjustment),
            fee_amount: self.fees.clone(),
            sign_mode: self.sign_mode.unwrap_or(defaults.sign_mode),
            memo: self.memo.clone(),
            chain_id: self.chain_id.clone().unwrap_or_default(),
            output_document: self.output_document.clone(),
            ..defaults
        }
    }
}
