use std::path::PathBuf;

use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::ValidateSignaturesMsg;
use kestrel_tx::TxOptions;

use crate::common::CliEnv;

#[derive(Debug, Parser)]
#[clap(about = "Check every signature of a stored transaction against its signers.")]
pub struct ValidateSignaturesCommand {
    #[arg(value_name = "FILE", help = "The signed transaction document.")]
    file: PathBuf,

    #[arg(long, value_name = "CHAIN_ID", help = "Overrides the configured chain id.")]
    chain_id: Option<String>,

    #[arg(long, help = "Skip the account number lookup.")]
    offline: bool,
}

impl ValidateSignaturesCommand {
    pub async fn execute(self, ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let Self {
            file,
            chain_id,
            offline,
        } = self;

        let client = env.client(&ctx, TxOptions::default(), offline).await?;
        let report = client
            .validate_signatures(ValidateSignaturesMsg {
                file,
                chain_id,
                offline,
            })
            .await?;
        print!("{report}");
        if !report.success {
            eyre::bail!("signature verification failed");
        }
        Ok(())
    }
}
