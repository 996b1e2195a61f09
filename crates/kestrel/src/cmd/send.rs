use clap::Parser;
use kestrel_cli_runner::CliContext;
use kestrel_client::TxRequest;
use kestrel_tx::{msgs::MsgSend, Coin, CosmosMsg, TxPublicKey};

use crate::{
    common::{CliEnv, KeyCliArgs, TxCliArgs},
    utils::{print_broadcast, print_document},
};

#[derive(Debug, Parser)]
#[clap(about = "Send coins with a bank transfer.")]
pub struct SendCommand {
    #[arg(value_name = "TO", help = "The recipient address.")]
    to: String,

    #[arg(value_name = "AMOUNT", help = "Comma-separated coins, e.g. 1000axpriv.")]
    amount: String,

    #[arg(
        long,
        value_name = "ADDRESS",
        help = "The sender. Defaults to the address of the signing key."
    )]
    from_address: Option<String>,

    #[arg(long, help = "Write an unsigned transaction for offline signing.")]
    unsigned: bool,

    #[arg(long, conflicts_with = "unsigned", help = "Broadcast the signed transaction.")]
    broadcast: bool,

    #[clap(flatten)]
    key: KeyCliArgs,

    #[clap(flatten)]
    tx: TxCliArgs,
}

impl SendCommand {
    pub async fn execute(self, ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let Self {
            to,
            amount,
            from_address,
            unsigned,
            broadcast,
            key,
            tx,
        } = self;

        let key = key.private_key(&env)?;
        let from_address = match (from_address, &key) {
            (Some(address), _) => address,
            (None, Some(key)) => TxPublicKey::from(key.public_key())
                .account_id(&env.config.account_prefix)?
                .to_string(),
            (None, None) => {
                eyre::bail!("no sender: pass --from-address, --from or --private-key-file")
            }
        };
        let amount = amount
            .split(',')
            .map(|coin| Coin::parse(coin.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        let msg = CosmosMsg::BankSend(MsgSend {
            from_address,
            to_address: to,
            amount,
        });

        let written = tx.output_document.is_some();
        let client = env.client(&ctx, tx.options(key), tx.offline).await?;
        if unsigned {
            let draft = client.create_unsigned_tx(vec![msg]).await?;
            print_document(written, &draft.to_json_pretty()?);
            return Ok(());
        }

        let signed = client.create_and_sign(TxRequest::Structured(vec![msg])).await?;
        if broadcast {
            print_broadcast(&client.broadcast(&signed).await?)
        } else {
            print_document(written, &signed.to_json_pretty()?);
            Ok(())
        }
    }
}
