use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estate_agents::{CompletionConfig, EstateAgent, GeminiClient};
use estate_observability::{init_tracing, AppMetrics};
use estate_storage::{seed_fixtures, BuyerRepository, SellerRepository, Store};

#[derive(Debug, Parser)]
#[command(name = "estate")]
#[command(about = "Real estate assistant CLI")]
struct Cli {
    #[arg(long, env = "ESTATE_DATABASE_URL", default_value = "sqlite://real_estate.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat through the completion service. Settings come from
    /// the same environment as the server; flags override them.
    Chat {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
    Buyers,
    Sellers,
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("estate_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat {
            api_key,
            model,
            timeout_seconds,
        } => {
            let config =
                apply_chat_overrides(CompletionConfig::from_env(), api_key, model, timeout_seconds);
            run_chat(config).await?;
        }
        Command::Buyers => {
            let store = connect_store(&cli.database_url).await?;
            let buyers = store.list_buyers().await?;
            println!("{}", serde_json::to_string_pretty(&buyers)?);
        }
        Command::Sellers => {
            let store = connect_store(&cli.database_url).await?;
            let sellers = store.list_sellers().await?;
            println!("{}", serde_json::to_string_pretty(&sellers)?);
        }
        Command::Seed => {
            let store = connect_store(&cli.database_url).await?;
            let report = seed_fixtures(&store).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn apply_chat_overrides(
    mut config: CompletionConfig,
    api_key: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
) -> CompletionConfig {
    if let Some(api_key) = api_key {
        config.api_key = Some(api_key);
    }
    if let Some(model) = model {
        config.model = model;
    }
    if let Some(seconds) = timeout_seconds {
        config.timeout = Duration::from_secs(seconds);
    }
    config
}

async fn connect_store(database_url: &str) -> Result<Store> {
    Store::connect(database_url)
        .await
        .with_context(|| format!("failed opening {}", database_url))
}

async fn run_chat(config: CompletionConfig) -> Result<()> {
    let deadline = config.timeout;
    let completion = GeminiClient::new(config)?;
    let agent = EstateAgent::new(Arc::new(completion), deadline, AppMetrics::shared());

    println!("Real estate assistant chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent.handle_chat(message).await;

        println!("\n[{}] {}", reply.intent, reply.automation);
        println!("{}\n", reply.reply);
    }

    Ok(())
}
