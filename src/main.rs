use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::Path;

use omnitrade::shared::config::{ConfigLoader, MultiChainConfig, Settings};
use omnitrade::shared::utils::format_amount;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect the resolved multi-chain trading configuration")]
struct Args {
    /// Path to a settings file (TOML); defaults to ./Config.toml when present
    #[arg(long)]
    config: Option<String>,

    /// Use the built-in testnet chain set
    #[arg(long, conflicts_with = "env")]
    testnet: bool,

    /// Resolve chains from ENABLED_CHAINS, DEFAULT_CHAIN and the *_RPC_URL variables
    #[arg(long)]
    env: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => {
            info!("Loading settings from {}", path);
            Settings::from_file(path)?
        }
        None if Path::new("Config.toml").exists() => {
            info!("Loading settings from Config.toml");
            ConfigLoader::load_config()?
        }
        None => Settings::default(),
    };

    if args.testnet {
        settings.chains = MultiChainConfig::testnet();
    } else if args.env {
        settings.chains = MultiChainConfig::from_env()?;
    }

    print_chains(&settings);
    Ok(())
}

fn print_chains(settings: &Settings) {
    let chains = &settings.chains;
    let engine = &settings.engine;

    println!("Default chain: {}", chains.default_chain);
    println!(
        "Preferred chains: {}",
        engine
            .preferred_chains
            .iter()
            .map(|chain| chain.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Slippage: {}%  Confirmation timeout: {}ms  Submission: {:?}",
        engine.default_slippage_tolerance, engine.confirmation_timeout_ms, engine.swap_submission
    );
    println!();
    println!(
        "{:<10} {:<14} {:<7} {:<8} {:<22} {:<45} {}",
        "CHAIN", "NAME", "NATIVE", "TESTNET", "GAS CEILING", "RPC", "VENUES"
    );

    for chain_id in &chains.enabled_chains {
        let config = chains.chain_config(*chain_id);
        let ceiling = engine
            .max_gas_prices
            .get(chain_id)
            .map(|ceiling| {
                let decimals = if chain_id.is_evm() { 9 } else { 0 };
                let unit = if chain_id.is_evm() { "gwei" } else { "lamports" };
                format!("{} {}", format_amount(u128::from(*ceiling), decimals), unit)
            })
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<10} {:<14} {:<7} {:<8} {:<22} {:<45} {}",
            chain_id.as_str(),
            config.name,
            config.native_currency.symbol,
            config.is_testnet,
            ceiling,
            config.rpc_urls.first().map(String::as_str).unwrap_or("-"),
            chains.dex_preferences(*chain_id).join(", ")
        );
    }
}
