//! P2SH Multisig CLI Application
//!
//! A command-line interface for creating, funding and spending M-of-N
//! multisig addresses.

use clap::{Parser, Subcommand};
use p2sh_multisig::cli::{self, CliConfig, CliResult};
use p2sh_multisig::core::Network;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(version = "0.1.0")]
#[command(about = "Build and sign raw P2SH multisig transactions", long_about = None)]
struct Cli {
    /// Network whose address and WIF version bytes are used
    #[arg(long, global = true, value_enum, default_value_t = Network::Mainnet)]
    network: Network,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate private/public key pairs and their P2PKH addresses
    Keys {
        /// Number of key pairs to generate (1-100)
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Print only the keys and addresses
        #[arg(long)]
        concise: bool,
    },

    /// Create an M-of-N P2SH address and its redeem script
    Address {
        /// Signatures required to spend (M)
        #[arg(long)]
        m: u8,

        /// Total number of public keys (N)
        #[arg(long)]
        n: u8,

        /// Public keys in hex (comma-separated)
        #[arg(long)]
        public_keys: String,
    },

    /// Fund a P2SH address from a P2PKH output
    Fund {
        /// WIF private key owning the input
        #[arg(long)]
        private_key: String,

        /// Transaction id whose output 0 is spent
        #[arg(long)]
        input_transaction: String,

        /// Amount to send in satoshis
        #[arg(long, visible_alias = "amount")]
        satoshis: u64,

        /// P2SH destination address
        #[arg(long)]
        destination: String,
    },

    /// Spend a P2SH multisig output to a P2PKH address
    Spend {
        /// WIF private keys, in redeem script key order (comma-separated)
        #[arg(long)]
        private_keys: String,

        /// P2PKH destination address
        #[arg(long)]
        destination: String,

        /// Redeem script in hex
        #[arg(long, visible_alias = "redeemScript")]
        redeem_script: String,

        /// Transaction id whose output 0 is spent
        #[arg(long)]
        input_transaction: String,

        /// Amount to send in satoshis
        #[arg(long, visible_alias = "amount")]
        satoshis: u64,
    },

    /// Decode a raw transaction and verify its signatures
    Decode {
        /// Raw transaction hex
        #[arg(short, long)]
        transaction: String,
    },
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig {
        network: cli.network,
        json: cli.json,
    };

    match cli.command {
        Commands::Keys { count, concise } => {
            cli::cmd_keys(&config, count, concise)?;
        }

        Commands::Address { m, n, public_keys } => {
            cli::cmd_address(&config, m, n, &public_keys)?;
        }

        Commands::Fund {
            private_key,
            input_transaction,
            satoshis,
            destination,
        } => {
            cli::cmd_fund(
                &config,
                &private_key,
                &input_transaction,
                satoshis,
                &destination,
            )?;
        }

        Commands::Spend {
            private_keys,
            destination,
            redeem_script,
            input_transaction,
            satoshis,
        } => {
            cli::cmd_spend(
                &config,
                &private_keys,
                &destination,
                &redeem_script,
                &input_transaction,
                satoshis,
            )?;
        }

        Commands::Decode { transaction } => {
            cli::cmd_decode(&config, &transaction)?;
        }
    }

    Ok(())
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}
