use kestrel_client::BroadcastResult;

/// Print a JSON document unless it already went to `--output-document`.
pub(crate) fn print_document(written: bool, bytes: &[u8]) {
    if !written {
        println!("{}", String::from_utf8_lossy(bytes));
    }
}

/// Print the node's answer; a non-zero check-tx code fails the command.
pub(crate) fn print_broadcast(result: &BroadcastResult) -> eyre::Result<()> {
    match result {
        BroadcastResult::Cosmos(response) => {
            println!("txhash: {}", response.txhash);
            println!("height: {}", response.height);
            println!("code: {}", response.code);
            if response.code != 0 {
                eyre::bail!("transaction rejected: {}", response.raw_log);
            }
        }
        BroadcastResult::Evm(hash) => println!("txhash: {hash}"),
    }
    Ok(())
}
