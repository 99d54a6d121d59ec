#![forbid(unsafe_code)]
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::Colorize;
use provchain::block::{Block, Transaction};
use provchain::config::load_config;
use provchain::miner::StopSignal;
use provchain::persistence::Ledger;
use provchain::validator::Validity;

#[derive(Parser)]
#[command(name = "provchain", about = "Supply-chain provenance ledger", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a transaction in the latest mined block
    Add {
        #[arg(long)]
        item_id: i32,
        #[arg(long)]
        description: String,
        /// Opaque signature string stored alongside the record
        #[arg(long, default_value = "")]
        signature: String,
    },
    /// Mine the next block onto the chain tip
    Mine,
    /// Print the chain
    Show {
        /// Emit the chain as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Check hash linkage across the chain
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config()?;
    let ledger = Ledger::open(&config.ledger.path, config.chain)?;

    match cli.command {
        Command::Add {
            item_id,
            description,
            signature,
        } => {
            ledger.append_transaction(Transaction {
                item_id,
                description,
                signature,
            })?;
            println!("{}", "✅ Transaction added successfully!".green());
        }
        Command::Mine => {
            let start = Instant::now();
            match ledger.mine_and_append(&StopSignal::new())? {
                Some(block) => {
                    println!(
                        "{}",
                        format!(
                            "✅ Block {} mined in {:.2}s! Nonce: {}, Hash: {}",
                            block.index,
                            start.elapsed().as_secs_f64(),
                            block.nonce,
                            block.hash
                        )
                        .green()
                    );
                }
                None => println!("{}", "Mining cancelled before a seal was found".yellow()),
            }
        }
        Command::Show { json } => {
            let chain = ledger.chain();
            if json {
                println!("{}", serde_json::to_string_pretty(&chain)?);
            } else if chain.is_empty() {
                println!("{}", "❌ No blocks found in the ledger.".red());
            } else {
                for block in &chain {
                    print_block(block);
                }
            }
        }
        Command::Validate => match ledger.validate() {
            Validity::Valid => println!("{}", "✅ Blockchain is VALID!".green()),
            Validity::Invalid { at } => {
                println!(
                    "{}",
                    format!("❌ Blockchain is INVALID at block {}!", at).red()
                );
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn print_block(block: &Block) {
    let when = chrono::DateTime::from_timestamp(block.timestamp as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| block.timestamp.to_string());

    println!("{}", format!("📜 Block {}", block.index).blue());
    println!("⏳ Timestamp: {}", when);
    println!("🔗 Previous Hash: {}", block.prev_hash);
    println!("🔗 Hash: {}", block.hash);
    println!("🔢 Nonce: {}", block.nonce);
    println!("📝 Transactions:");
    for tx in &block.transactions {
        println!(
            "   - [{}] {} (Signed: {})",
            tx.item_id, tx.description, tx.signature
        );
    }
    println!();
}
