use clap::{Parser, Subcommand};
use kestrel_cli_runner::CliContext;
use kestrel_client::TxRequest;
use kestrel_evm::EvmMsg;
use kestrel_primitives::alloy_primitives::{Address, Bytes, U256};

use crate::{
    common::{CliEnv, KeyCliArgs, TxCliArgs},
    utils::{print_broadcast, print_document},
};

#[derive(Debug, Parser)]
#[clap(about = "Sign a legacy EVM transaction.")]
pub struct EvmSendCommand {
    #[command(subcommand)]
    msg: EvmMsgCommand,

    #[arg(long, global = true, help = "Broadcast over the EVM JSON-RPC endpoint.")]
    broadcast: bool,

    #[clap(flatten)]
    key: KeyCliArgs,

    #[clap(flatten)]
    tx: TxCliArgs,
}

#[derive(Debug, Subcommand)]
pub enum EvmMsgCommand {
    #[command(name = "coin", about = "Transfer native coins.")]
    SendCoin {
        #[arg(value_name = "TO")]
        to: Address,
        #[arg(value_name = "AMOUNT")]
        amount: U256,
    },

    #[command(name = "invoke", about = "Call a contract.")]
    InvokeContract {
        #[arg(value_name = "CONTRACT")]
        contract: Address,
        #[arg(value_name = "CALLDATA", help = "Hex-encoded calldata.")]
        calldata: Bytes,
        #[arg(long, default_value = "0")]
        value: U256,
    },

    #[command(name = "deploy", about = "Deploy a contract.")]
    DeployContract {
        #[arg(value_name = "BYTECODE", help = "Hex-encoded creation bytecode.")]
        bytecode: Bytes,
        #[arg(long, default_value = "0")]
        value: U256,
    },
}

impl From<EvmMsgCommand> for EvmMsg {
    fn from(cmd: EvmMsgCommand) -> Self {
        match cmd {
            EvmMsgCommand::SendCoin { to, amount } => EvmMsg::SendCoin { to, amount },
            EvmMsgCommand::InvokeContract {
                contract,
                calldata,
                value,
            } => EvmMsg::InvokeContract {
                contract,
                calldata,
                value,
            },
            EvmMsgCommand::DeployContract { bytecode, value } => {
                EvmMsg::DeployContract { bytecode, value }
            }
        }
    }
}

impl EvmSendCommand {
    pub async fn execute(self, ctx: CliContext, env: CliEnv) -> eyre::Result<()> {
        let Self {
            msg,
            broadcast,
            key,
            tx,
        } = self;

        let key = key.private_key(&env)?;
        let written = tx.output_document.is_some();
        let client = env.client(&ctx, tx.options(key), tx.offline).await?;
        let signed = client.create_and_sign(TxRequest::RawEvm(msg.into())).await?;
        if broadcast {
            print_broadcast(&client.broadcast(&signed).await?)
        } else {
            print_document(written, &signed.to_json_pretty()?);
            Ok(())
        }
    }
}
