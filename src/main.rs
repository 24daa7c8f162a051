//! llm-meter gateway binary

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use llm_meter::services::pricing::{PricingService, SqlDialect};
use llm_meter::utils::logging::init_logging;
use llm_meter::{NAME, Result, VERSION, server};
use std::process::ExitCode;

/// Metering reverse proxy for LLM provider APIs
#[derive(Parser)]
#[command(name = NAME)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file path (defaults to config/gateway.yaml when present)
    #[arg(short, long, env = "METER_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Run,
    /// Print the effective configuration after environment overrides
    Config,
    /// Print the warehouse cost aggregate for the loaded cost rules
    Sql {
        /// Table holding the response rows
        #[arg(short, long, default_value = "response_log")]
        table: String,
        /// SQL dialect (clickhouse, postgres, sqlite)
        #[arg(short, long, default_value = "clickhouse")]
        dialect: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = server::load_config(cli.config.as_deref()).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_logging(config.logging())?;
            server::run_server(config).await
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        Commands::Sql { table, dialect } => {
            let dialect: SqlDialect = dialect.parse()?;
            let pricing = PricingService::from_config(config.pricing()).await?;
            println!("{}", pricing.aggregate_sql(&table, dialect)?);
            Ok(())
        }
    }
}
