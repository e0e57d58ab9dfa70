//! CLI commands for the multisig tool
//!
//! Implements all command handlers for the CLI interface. Results go to
//! stdout, either human-readable or as pretty-printed JSON.

use serde::Serialize;

use crate::core::{disassemble, Network, RawTransaction};
use crate::crypto::{base58check_encode, SigningContext};
use crate::multisig::{
    generate_address, generate_fund, generate_spend, inspect_input, InputKind,
};
use crate::wallet::generate_wallets;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Settings shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    pub network: Network,
    /// Print JSON instead of the human-readable layout
    pub json: bool,
}

/// Split a comma-separated key list, dropping surrounding whitespace and
/// quotes from each entry. An empty entry is an error.
pub fn split_list(input: &str, item_name: &str) -> CliResult<Vec<String>> {
    input
        .split(',')
        .map(|item| item.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\''))
        .enumerate()
        .map(|(i, item)| -> CliResult<String> {
            if item.is_empty() {
                Err(format!("Provided {} #{} cannot be empty", item_name, i + 1).into())
            } else {
                Ok(item.to_string())
            }
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Generate key pairs
pub fn cmd_keys(config: &CliConfig, count: usize, concise: bool) -> CliResult<()> {
    let wallets = generate_wallets(count, config.network)?;

    if config.json {
        return print_json(&wallets);
    }

    if !concise {
        println!("----------------------------------------------------------------------");
        println!("THESE KEY PAIRS ARE FOR DEMONSTRATION PURPOSES ONLY.");
        println!("----------------------------------------------------------------------");
        println!("Each generated key pair includes:");
        println!("* Private key (WIF)   -- keep this private, needed to spend received coins");
        println!("* Public key (hex)    -- required to generate a multisig address");
        println!("* Address (P2PKH)     -- give this to people sending you coins");
        println!("----------------------------------------------------------------------");
    }

    for (i, wallet) in wallets.iter().enumerate() {
        println!("🔐 Key #{}", i + 1);
        if concise {
            println!("   {}", wallet.private_key);
            println!("   {}", wallet.public_key);
            println!("   {}", wallet.address);
        } else {
            println!("   🔑 Private key: {}", wallet.private_key);
            println!("   📣 Public key:  {}", wallet.public_key);
            println!("   📍 Address:     {}", wallet.address);
        }
        println!();
    }

    Ok(())
}

/// Create a P2SH multisig address
pub fn cmd_address(config: &CliConfig, m: u8, n: u8, public_keys: &str) -> CliResult<()> {
    let public_keys = split_list(public_keys, "public key")?;
    let result = generate_address(m, n, &public_keys, config.network)?;

    if config.json {
        return print_json(&result);
    }

    println!("✅ {} P2SH address created!", result.description());
    println!("   📍 Address: {}", result.address);
    println!("      Give this to the sender funding the multisig address.");
    println!("   📜 Redeem script: {}", result.redeem_script);
    println!("      Keep this and provide it to redeem the multisig balance later.");
    if !result.standard {
        println!(
            "⚠️  A {}-of-{} spend exceeds the standard scriptSig size; nodes may refuse to relay it",
            m, n
        );
    }

    Ok(())
}

/// Fund a P2SH address from a P2PKH output
pub fn cmd_fund(
    config: &CliConfig,
    private_key: &str,
    input_transaction: &str,
    satoshis: u64,
    destination: &str,
) -> CliResult<()> {
    let ctx = SigningContext::new();
    let result = generate_fund(
        &ctx,
        private_key,
        input_transaction,
        satoshis,
        destination,
        config.network,
    )?;

    if config.json {
        return print_json(&result);
    }

    println!("✅ Funding transaction signed!");
    println!("   ├─ From: {}", result.source_address);
    println!("   ├─ To: {}", result.destination);
    println!("   ├─ Amount: {} satoshis", result.satoshis);
    println!("   └─ TxID: {}", result.txid);
    println!();
    println!("{}", result.transaction);

    Ok(())
}

/// Spend a P2SH multisig output to a P2PKH address
pub fn cmd_spend(
    config: &CliConfig,
    private_keys: &str,
    destination: &str,
    redeem_script: &str,
    input_transaction: &str,
    satoshis: u64,
) -> CliResult<()> {
    let private_keys = split_list(private_keys, "private key")?;
    let ctx = SigningContext::new();
    let result = generate_spend(
        &ctx,
        &private_keys,
        destination,
        redeem_script,
        input_transaction,
        satoshis,
        config.network,
    )?;

    if config.json {
        return print_json(&result);
    }

    println!(
        "✅ {}-of-{} spend signed with {} key(s)!",
        result.m, result.n, result.signatures
    );
    println!("   ├─ From: {}", result.source_address);
    println!("   ├─ To: {}", result.destination);
    println!("   ├─ Amount: {} satoshis", result.satoshis);
    println!("   └─ TxID: {}", result.txid);
    println!();
    println!("{}", result.transaction);

    Ok(())
}

/// Decoded view of a raw transaction
#[derive(Debug, Serialize)]
pub struct DecodedTransaction {
    pub txid: String,
    pub version: u32,
    pub input_transaction: String,
    pub input_index: u32,
    pub script_sig: String,
    pub script_sig_asm: String,
    pub sequence: u32,
    pub satoshis: u64,
    pub script_pubkey: String,
    pub script_pubkey_asm: String,
    /// Address paid by the output, when it is a P2PKH or P2SH template
    pub destination: Option<String>,
    pub lock_time: u32,
    pub input: InputKind,
}

fn output_address(script_pubkey: &[u8], network: Network) -> Option<String> {
    match script_pubkey {
        [0xa9, 0x14, hash @ .., 0x87] if hash.len() == 20 => {
            Some(base58check_encode(network.p2sh_version(), hash))
        }
        [0x76, 0xa9, 0x14, hash @ .., 0x88, 0xac] if hash.len() == 20 => {
            Some(base58check_encode(network.p2pkh_version(), hash))
        }
        _ => None,
    }
}

fn asm_or_placeholder(script: &[u8]) -> String {
    disassemble(script).unwrap_or_else(|e| format!("<unparseable: {}>", e))
}

/// Parse a raw transaction and check its signatures
pub fn decode_transaction(transaction: &str, network: Network) -> CliResult<DecodedTransaction> {
    let tx = RawTransaction::from_hex(transaction)?;
    let ctx = SigningContext::new();
    let input = inspect_input(&ctx, &tx, network)?;

    let script_sig = &tx.input().script_sig;
    let script_pubkey = &tx.output().script_pubkey;

    Ok(DecodedTransaction {
        txid: tx.txid(),
        version: tx.version(),
        input_transaction: tx.previous_txid_hex(),
        input_index: tx.input().previous_index,
        script_sig: hex::encode(script_sig),
        script_sig_asm: asm_or_placeholder(script_sig),
        sequence: tx.input().sequence,
        satoshis: tx.output().satoshis,
        script_pubkey: hex::encode(script_pubkey),
        script_pubkey_asm: asm_or_placeholder(script_pubkey),
        destination: output_address(script_pubkey, network),
        lock_time: tx.lock_time(),
        input,
    })
}

/// Decode a raw transaction
pub fn cmd_decode(config: &CliConfig, transaction: &str) -> CliResult<()> {
    let decoded = decode_transaction(transaction, config.network)?;

    if config.json {
        return print_json(&decoded);
    }

    println!("📦 Transaction {}", decoded.txid);
    println!("   ├─ Version: {}", decoded.version);
    println!(
        "   ├─ Input: {}:{}",
        decoded.input_transaction, decoded.input_index
    );
    println!("   │  └─ scriptSig: {}", decoded.script_sig_asm);
    println!("   ├─ Output: {} satoshis", decoded.satoshis);
    println!("   │  ├─ scriptPubKey: {}", decoded.script_pubkey_asm);
    if let Some(destination) = &decoded.destination {
        println!("   │  └─ Address: {}", destination);
    }
    println!("   └─ Locktime: {}", decoded.lock_time);
    println!();

    match &decoded.input {
        InputKind::P2pkh(fund) => {
            let status = if fund.valid { "✅ valid" } else { "❌ INVALID" };
            println!("🔏 P2PKH spend signed by {}: {}", fund.address, status);
        }
        InputKind::Multisig(spend) => {
            let status = if spend.valid { "✅ valid" } else { "❌ INVALID" };
            println!(
                "🔏 {}-of-{} multisig spend from {} with {} signature(s): {}",
                spend.m, spend.n, spend.address, spend.signatures, status
            );
        }
        InputKind::Unsigned => println!("📝 Unsigned transaction"),
        InputKind::Unknown => println!("❓ Unrecognized scriptSig"),
    }

    Ok(())
}
