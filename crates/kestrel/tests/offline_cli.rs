use std::path::Path;

use clap::Parser;
use kestrel::{
    cmd::{
        evm_send::EvmSendCommand, send::SendCommand, sign::SignCommand,
        validate_signatures::ValidateSignaturesCommand,
    },
    common::CliEnv,
};
use kestrel_cli_runner::CliContext;
use kestrel_client::ClientConfig;
use kestrel_primitives::{KeyAlgo, PrivateKey};
use kestrel_tx::{Tx, TxPublicKey};
use serde_json::Value;
use tempfile::tempdir;

const CHAIN_ID: &str = "cube_47-5";

fn env(dir: &Path) -> CliEnv {
    CliEnv {
        config: ClientConfig {
            chain_id: CHAIN_ID.into(),
            ..Default::default()
        },
        data_dir: dir.to_path_buf(),
    }
}

fn key_file(dir: &Path, seed: u8) -> (String, String) {
    let path = dir.join(format!("key-{seed}.hex"));
    std::fs::write(&path, hex_key(seed)).unwrap();
    let key = PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[seed; 32]).unwrap();
    let address = TxPublicKey::from(key.public_key())
        .account_id("xpla")
        .unwrap()
        .to_string();
    (path.display().to_string(), address)
}

fn hex_key(seed: u8) -> String {
    format!("{seed:02x}").repeat(32)
}

#[tokio::test]
async fn unsigned_send_then_sign_then_validate() {
    let dir = tempdir().unwrap();
    let (key_path, address) = key_file(dir.path(), 3);
    let unsigned = dir.path().join("unsigned.json");
    let signed = dir.path().join("signed.json");

    SendCommand::try_parse_from([
        "send",
        &address,
        "1000axpriv",
        "--from-address",
        &address,
        "--unsigned",
        "--offline",
        "--output-document",
        unsigned.to_str().unwrap(),
    ])
    .unwrap()
    .execute(CliContext::default(), env(dir.path()))
    .await
    .unwrap();
    let draft = Tx::from_json(&std::fs::read(&unsigned).unwrap()).unwrap();
    assert!(!draft.is_signed());

    SignCommand::try_parse_from([
        "sign",
        unsigned.to_str().unwrap(),
        "--private-key-file",
        &key_path,
        "--offline",
        "--output-document",
        signed.to_str().unwrap(),
    ])
    .unwrap()
    .execute(CliContext::default(), env(dir.path()))
    .await
    .unwrap();
    assert!(Tx::from_json(&std::fs::read(&signed).unwrap())
        .unwrap()
        .is_signed());

    ValidateSignaturesCommand::try_parse_from([
        "validate-signatures",
        signed.to_str().unwrap(),
        "--offline",
    ])
    .unwrap()
    .execute(CliContext::default(), env(dir.path()))
    .await
    .unwrap();
}

#[tokio::test]
async fn send_needs_a_sender() {
    let dir = tempdir().unwrap();
    let err = SendCommand::try_parse_from(["send", "xpla1xyz", "1axpriv", "--offline"])
        .unwrap()
        .execute(CliContext::default(), env(dir.path()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no sender"));
}

#[tokio::test]
async fn evm_send_writes_json_document() {
    let dir = tempdir().unwrap();
    let (key_path, _) = key_file(dir.path(), 4);
    let out = dir.path().join("evm.json");

    EvmSendCommand::try_parse_from([
        "evm-send",
        "--private-key-file",
        &key_path,
        "--offline",
        "--sequence",
        "2",
        "--output-document",
        out.to_str().unwrap(),
        "coin",
        "0x00000000000000000000000000000000000000bb",
        "1000",
    ])
    .unwrap()
    .execute(CliContext::default(), env(dir.path()))
    .await
    .unwrap();

    let json: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(json["chainId"], "0x2f");
    assert_eq!(json["nonce"], "0x2");
    assert_eq!(json["value"], "0x3e8");
}
