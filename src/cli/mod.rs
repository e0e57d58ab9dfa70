//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_address, cmd_decode, cmd_fund, cmd_keys, cmd_spend, decode_transaction, split_list,
    CliConfig, CliResult, DecodedTransaction,
};
