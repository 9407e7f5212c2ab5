//! MarketMind CLI host.
//!
//! Usage:
//!   marketmind ask "I sold 10 tomatoes for 500 naira"
//!   marketmind chat [--autonomous]   Read messages from stdin
//!   marketmind status                Show the on-chain business summary
//!   marketmind autonomous            Run only the decision loop

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use marketmind::agent::MarketAgent;
use marketmind::config::{self, AppConfig};
use marketmind::heartbeat::DecisionLoop;
use marketmind::identity::Wallet;
use marketmind::ledger::{ChainGateway, HttpTransport, Ledger};
use marketmind::types::{InboundMessage, Reply};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "marketmind")]
#[command(version)]
#[command(about = "Conversational business agent for market vendors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.marketmind/marketmind.toml).
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one message through the agent.
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Interactive session: one message per line on stdin.
    Chat {
        /// Also run the autonomous decision loop.
        #[arg(long)]
        autonomous: bool,
    },

    /// Print the current business state.
    Status,

    /// Run the autonomous decision loop until Ctrl+C.
    Autonomous,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    cfg.apply_env_overrides();

    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask { text } => cmd_ask(cfg, &text.join(" ")).await,
        Commands::Chat { autonomous } => cmd_chat(cfg, autonomous).await,
        Commands::Status => cmd_status(cfg).await,
        Commands::Autonomous => cmd_autonomous(cfg).await,
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_ask(cfg: AppConfig, text: &str) -> Result<()> {
    let agent = bootstrap(&cfg)?;
    let reply = agent.handle_message(&InboundMessage::new(text)).await;
    print_reply(&reply);
    Ok(())
}

async fn cmd_status(cfg: AppConfig) -> Result<()> {
    let agent = bootstrap(&cfg)?;

    println!();
    println!("{}", "=== MarketMind Status ===".bold());
    println!();
    println!("  {}:  {}", "Agent".bold(), cfg.chain.agent_address);
    println!("  {}:  {}", "Chain".bold(), cfg.chain.chain_id);
    println!();
    println!("{}", agent.business_context().await);
    println!();
    Ok(())
}

async fn cmd_chat(mut cfg: AppConfig, autonomous: bool) -> Result<()> {
    if autonomous {
        cfg.autonomy.enabled = true;
    }
    let agent = Arc::new(bootstrap(&cfg)?);
    let cancel = CancellationToken::new();

    let loop_handle = if autonomous {
        Some(spawn_decision_loop(&agent, &cfg, cancel.clone()))
    } else {
        None
    };

    println!(
        "{} MarketMind ready. Type a message, Ctrl+C to quit.",
        ">>>".green().bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => {
                        let agent = Arc::clone(&agent);
                        inflight.spawn(async move {
                            let reply = agent.handle_message(&InboundMessage::new(line)).await;
                            print_reply(&reply);
                        });
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{} Shutting down...", "<<<".red().bold());
                break;
            }
        }
    }

    cancel.cancel();

    let shutdown_timeout = tokio::time::Duration::from_secs(10);
    let _ = tokio::time::timeout(shutdown_timeout, async {
        while let Some(joined) = inflight.join_next().await {
            if let Err(e) = joined {
                warn!("Message task join error: {}", e);
            }
        }
        if let Some(handle) = loop_handle {
            if let Err(e) = handle.await {
                warn!("Decision loop join error: {}", e);
            }
        }
    })
    .await;

    info!("Chat session closed");
    Ok(())
}

async fn cmd_autonomous(mut cfg: AppConfig) -> Result<()> {
    cfg.autonomy.enabled = true;
    let agent = Arc::new(bootstrap(&cfg)?);
    let cancel = CancellationToken::new();

    println!(
        "{} Decision loop running every {}s. Ctrl+C to stop.",
        ">>>".green().bold(),
        cfg.autonomy.interval_secs
    );
    let handle = spawn_decision_loop(&agent, &cfg, cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    println!("\n{} Shutting down...", "<<<".red().bold());
    cancel.cancel();

    let shutdown_timeout = tokio::time::Duration::from_secs(10);
    match tokio::time::timeout(shutdown_timeout, handle).await {
        Ok(Err(e)) => warn!("Decision loop join error: {}", e),
        Err(_) => warn!("Decision loop still busy after {:?}; exiting", shutdown_timeout),
        Ok(Ok(())) => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate config and wire the agent over the live gateway.
fn bootstrap(cfg: &AppConfig) -> Result<MarketAgent> {
    cfg.validate()?;

    let wallet =
        Wallet::from_private_key(&cfg.chain.private_key).context("Failed to load signing key")?;
    let transport = HttpTransport::new(&cfg.chain.rpc_url, cfg.rpc_timeout())
        .context("Failed to build RPC client")?;
    let gateway = ChainGateway::new(
        transport,
        cfg.contract_addresses(),
        wallet,
        cfg.gateway_settings(),
    );
    info!(
        sender = gateway.sender(),
        rpc = %cfg.chain.rpc_url,
        "Ledger gateway ready"
    );

    let directory = cfg.supplier_directory();
    if directory.is_empty() {
        warn!("No suppliers configured; supplier payments will ask for clarification");
    } else {
        info!(suppliers = directory.len(), "Supplier directory loaded");
    }

    let ledger: Arc<dyn Ledger> = Arc::new(gateway);
    Ok(MarketAgent::with_ledger(
        ledger,
        Arc::new(directory),
        cfg.router_settings(),
    ))
}

fn spawn_decision_loop(
    agent: &MarketAgent,
    cfg: &AppConfig,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut decision_loop =
        DecisionLoop::new(agent.router(), agent.aggregator(), cfg.autonomy.clone());
    tokio::spawn(async move { decision_loop.run(cancel).await })
}

fn print_reply(reply: &Reply) {
    match &reply.action_tag {
        Some(tag) => println!("{} {}\n{}", "marketmind>".green().bold(), tag.dimmed(), reply.text),
        None => println!("{} {}", "marketmind>".yellow().bold(), reply.text),
    }
}
