use std::path::PathBuf;

use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::TxMultiSignMsg;

use crate::{
    common::{CliEnv, TxCliArgs},
    utils::print_document,
};

#[derive(Debug, Parser)]
#[clap(about = "Combine cosigner signatures into a multisig transaction.")]
pub struct MultisignCommand {
    #[arg(value_name = "FILE", help = "The unsigned transaction document.")]
    file: PathBuf,

    #[arg(value_name = "NAME", help = "The multisig key in the keyring.")]
    name: String,

    #[arg(
        value_name = "SIGNATURES",
        num_args = 1..,
        required = true,
        help = "Cosigner signature documents."
    )]
    signature_files: Vec<PathBuf>,

    #[arg(long, help = "Output only the composite signature.")]
    signature_only: bool,

    #[arg(long, help = "Output a legacy amino broadcast request.")]
    amino: bool,

    #[clap(flatten)]
    tx: TxCliArgs,
}

impl MultisignCommand {
    pub async fn execute(self, ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let Self {
            file,
            name,
            signature_files,
            signature_only,
            amino,
            tx,
        } = self;

        let written = tx.output_document.is_some();
        let client = env
            .client(&ctx, tx.options(None), tx.offline)
            .await?
            .with_keyring(env.keyring()?);
        let doc = client
            .multi_sign(TxMultiSignMsg {
                file,
                from_name: name,
                signature_files,
                offline: tx.offline,
                signature_only,
                amino,
                output_document: None,
            })
            .await?;
        print_document(written, &doc.to_json_pretty()?);
        Ok(())
    }
}
