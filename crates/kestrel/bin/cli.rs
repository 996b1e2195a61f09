use std::path::PathBuf;

use clap::{
    builder::{styling::AnsiColor, Styles},
    Parser, Subcommand,
};
use kestrel::{
    cmd::{
        decode::DecodeCommand, encode::EncodeCommand, evm_send::EvmSendCommand,
        multisign::MultisignCommand, send::SendCommand, sign::SignCommand,
        validate_signatures::ValidateSignaturesCommand,
    },
    common::{CliEnv, DatadirCliArgs},
};
use kestrel_cli_runner::CliRunner;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "kestrel",
    about = "Build, sign and broadcast Cosmos and EVM transactions.",
    version = env!("CARGO_PKG_VERSION"),
    term_width = 80,
    styles = get_color_style()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Client config, YAML or JSON. Defaults to {data_dir}/config.yml when present."
    )]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub data_dir: DatadirCliArgs,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl Cli {
    pub fn run(self) -> eyre::Result<()> {
        init_tracing(self.debug, self.json_logs);
        let env = CliEnv::load(self.config.as_deref(), self.data_dir.get_data_dir())?;

        let runner = CliRunner::default();
        match self.command {
            Commands::Send(send) => runner.run_command_until_exit(|ctx| send.execute(ctx, env)),
            Commands::Sign(sign) => runner.run_command_until_exit(|ctx| sign.execute(ctx, env)),
            Commands::Multisign(multisign) => {
                runner.run_command_until_exit(|ctx| multisign.execute(ctx, env))
            }
            Commands::Encode(encode) => {
                runner.run_command_until_exit(|ctx| encode.execute(ctx, env))
            }
            Commands::Decode(decode) => {
                runner.run_command_until_exit(|ctx| decode.execute(ctx, env))
            }
            Commands::ValidateSignatures(validate) => {
                runner.run_command_until_exit(|ctx| validate.execute(ctx, env))
            }
            Commands::EvmSend(evm_send) => {
                runner.run_command_until_exit(|ctx| evm_send.execute(ctx, env))
            }
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "send")]
    Send(SendCommand),

    #[command(name = "sign")]
    Sign(SignCommand),

    #[command(name = "multisign")]
    Multisign(MultisignCommand),

    #[command(name = "encode")]
    Encode(EncodeCommand),

    #[command(name = "decode")]
    Decode(DecodeCommand),

    #[command(name = "validate-signatures")]
    ValidateSignatures(ValidateSignaturesCommand),

    #[command(name = "evm-send")]
    EvmSend(EvmSendCommand),
}

/// Logs go to stderr so documents on stdout stay pipeable.
fn init_tracing(debug: bool, json: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    // a second init in the same process keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn get_color_style() -> Styles {
    Styles::styled()
        .usage(AnsiColor::Green.on_default().bold().underline())
        .header(AnsiColor::Yellow.on_default().bold().underline())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kestrel",
            "encode",
            "tx.json",
            "--debug",
            "--config",
            "kestrel.yml",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("kestrel.yml")));
        assert!(matches!(cli.command, Commands::Encode(_)));
    }

    #[test]
    fn evm_send_subcommands() {
        let cli = Cli::try_parse_from([
            "kestrel",
            "evm-send",
            "--offline",
            "invoke",
            "0x00000000000000000000000000000000000000bb",
            "0xa9059cbb",
            "--value",
            "7",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::EvmSend(_)));
        assert!(
            Cli::try_parse_from(["kestrel", "evm-send", "coin", "not-an-address", "1"]).is_err()
        );
    }
}
