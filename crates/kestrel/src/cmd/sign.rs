use std::path::PathBuf;

use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::SignTxMsg;

use crate::{
    common::{CliEnv, KeyCliArgs, TxCliArgs},
    utils::print_document,
};

#[derive(Debug, Parser)]
#[clap(about = "Sign a stored unsigned transaction.")]
pub struct SignCommand {
    #[arg(value_name = "FILE", help = "The unsigned transaction document.")]
    file: PathBuf,

    #[arg(
        long,
        value_name = "ADDRESS",
        help = "Cosign for this multisig. Produces a signature-only amino-json document."
    )]
    multisig: Option<String>,

    #[arg(long, value_name = "ADDRESS", help = "Fail unless the key has this address.")]
    from_address: Option<String>,

    #[arg(long, help = "Output only the signatures.")]
    signature_only: bool,

    #[arg(long, help = "Replace existing signatures instead of appending.")]
    overwrite: bool,

    #[arg(long, help = "Sign in amino-json mode.")]
    amino: bool,

    #[clap(flatten)]
    key: KeyCliArgs,

    #[clap(flatten)]
    tx: TxCliArgs,
}

impl SignCommand {
    pub async fn execute(self, ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let Self {
            file,
            multisig,
            from_address,
            signature_only,
            overwrite,
            amino,
            key,
            tx,
        } = self;

        let key = key.private_key(&env)?;
        let written = tx.output_document.is_some();
        let client = env.client(&ctx, tx.options(key), tx.offline).await?;
        let doc = client
            .sign_tx(SignTxMsg {
                unsigned_file: file,
                signature_only,
                multisig_address: multisig,
                from_address,
                overwrite,
                amino,
                offline: tx.offline,
            })
            .await?;
        print_document(written, &doc.to_json_pretty()?);
        Ok(())
    }
}
