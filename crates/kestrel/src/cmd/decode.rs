use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::TxClient;
use kestrel_tx::TxOptions;

use crate::{common::CliEnv, utils::print_document};

#[derive(Debug, Parser)]
#[clap(about = "Print base64 wire bytes as a transaction document.")]
pub struct DecodeCommand {
    #[arg(value_name = "BASE64", help = "The encoded transaction.")]
    encoded: String,
}

impl DecodeCommand {
    pub async fn execute(self, _ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let client = TxClient::new(env.config, TxOptions::default());
        let tx = client.decode_tx(&self.encoded)?;
        print_document(false, &tx.to_json_pretty()?);
        Ok(())
    }
}
