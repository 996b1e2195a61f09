use std::path::PathBuf;

use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::TxClient;
use kestrel_tx::TxOptions;

use crate::common::CliEnv;

#[derive(Debug, Parser)]
#[clap(about = "Print a stored transaction as base64 wire bytes.")]
pub struct EncodeCommand {
    #[arg(value_name = "FILE", help = "The transaction document.")]
    file: PathBuf,
}

impl EncodeCommand {
    pub async fn execute(self, _ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let client = TxClient::new(env.config, TxOptions::default());
        println!("{}", client.encode_tx(&self.file)?);
        Ok(())
    }
}
