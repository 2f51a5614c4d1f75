use clap::Parser;
use dotenv::dotenv;
use kalman_pairs::cli::{Cli, Commands};
use kalman_pairs::commands::{run_backtest, run_coint};
use kalman_pairs::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.verbose, cli.json_logs)?;

    match &cli.command {
        Commands::Backtest(args) => {
            run_backtest(args.to_config()?).await?;
        }
        Commands::Coint(args) => {
            run_coint(args.to_config()?)?;
        }
    }

    Ok(())
}
