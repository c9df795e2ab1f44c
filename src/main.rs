use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wealthcalc::api::{ServerConfig, run_http_server};
use wealthcalc::core::{CalculatorType, ParameterSet, calculate, format_currency};
use wealthcalc::insight::{DEFAULT_ENDPOINT, DEFAULT_MODEL, STARTER_CREDITS};

#[derive(Parser, Debug)]
#[command(
    name = "wealthcalc",
    about = "Personal finance calculators (SIP, FD, retirement, inflation, net worth...) with AI insights"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Run one projection and print it
    Calc(CalcArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    gemini_model: String,
    #[arg(long, env = "GEMINI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    gemini_endpoint: String,
    #[arg(
        long,
        default_value_t = 30,
        help = "Timeout for one narrative request in seconds"
    )]
    insight_timeout_secs: u64,
    #[arg(
        long,
        default_value_t = STARTER_CREDITS,
        help = "Credits granted to a user on first sight"
    )]
    starting_credits: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCalculatorType {
    Sip,
    Fd,
    MutualFund,
    Retirement,
    Inflation,
    CompoundInterest,
    NetWorth,
    EmergencyFund,
}

impl From<CliCalculatorType> for CalculatorType {
    fn from(value: CliCalculatorType) -> Self {
        match value {
            CliCalculatorType::Sip => CalculatorType::Sip,
            CliCalculatorType::Fd => CalculatorType::Fd,
            CliCalculatorType::MutualFund => CalculatorType::MutualFund,
            CliCalculatorType::Retirement => CalculatorType::Retirement,
            CliCalculatorType::Inflation => CalculatorType::Inflation,
            CliCalculatorType::CompoundInterest => CalculatorType::CompoundInterest,
            CliCalculatorType::NetWorth => CalculatorType::NetWorth,
            CliCalculatorType::EmergencyFund => CalculatorType::EmergencyFund,
        }
    }
}

#[derive(Args, Debug)]
struct CalcArgs {
    #[arg(value_enum)]
    calculator: CliCalculatorType,
    #[arg(
        long,
        help = "Monthly saving, lumpsum principal, or current cost (inflation)"
    )]
    amount: Option<f64>,
    #[arg(long, help = "Expected annual return in percent, e.g. 12")]
    rate: Option<f64>,
    #[arg(long, help = "Horizon in years; months of buffer for emergency-fund")]
    years: Option<f64>,
    #[arg(long, help = "Annual inflation in percent")]
    inflation: Option<f64>,
    #[arg(long, help = "Monthly expense")]
    expense: Option<f64>,
    #[arg(long)]
    assets: Option<f64>,
    #[arg(long)]
    liabilities: Option<f64>,
    #[arg(long, help = "Print the result as JSON")]
    json: bool,
}

impl CalcArgs {
    fn parameters(&self) -> ParameterSet {
        let defaults = ParameterSet::default();
        ParameterSet {
            monthly_contribution: self.amount.unwrap_or(defaults.monthly_contribution),
            annual_rate_percent: self.rate.unwrap_or(defaults.annual_rate_percent),
            years: self.years.unwrap_or(defaults.years),
            inflation_rate_percent: self.inflation.unwrap_or(defaults.inflation_rate_percent),
            monthly_expense: self.expense.unwrap_or(defaults.monthly_expense),
            total_assets: self.assets.unwrap_or(defaults.total_assets),
            total_liabilities: self.liabilities.unwrap_or(defaults.total_liabilities),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_calc(args: &CalcArgs) -> Result<(), String> {
    let kind: CalculatorType = args.calculator.into();
    let params = args.parameters();
    let result = calculate(kind, &params).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", kind.title());
    println!("{}", "-".repeat(40));
    println!("{:<22} {:>17}", "Total value", format_currency(result.total_value));
    println!("{:<22} {:>17}", "Invested amount", format_currency(result.invested_amount));
    println!("{:<22} {:>17}", "Returns", format_currency(result.returns));
    for segment in &result.segments {
        println!("{:<22} {:>17}", segment.label, format_currency(segment.value));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig {
                port: args.port,
                gemini_api_key: args.gemini_api_key,
                gemini_model: args.gemini_model,
                gemini_endpoint: args.gemini_endpoint,
                insight_timeout: Duration::from_secs(args.insight_timeout_secs),
                starting_credits: args.starting_credits,
            };
            if let Err(e) = run_http_server(config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Calc(args) => {
            if let Err(e) = run_calc(&args) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calc_args_fill_defaults_and_map_type() {
        let cli = Cli::try_parse_from([
            "wealthcalc",
            "calc",
            "emergency-fund",
            "--expense",
            "2500",
            "--years",
            "9",
        ])
        .expect("valid args");
        let Command::Calc(args) = cli.command else {
            panic!("expected calc subcommand");
        };
        assert_eq!(CalculatorType::from(args.calculator), CalculatorType::EmergencyFund);
        let params = args.parameters();
        assert_eq!(params.monthly_expense, 2_500.0);
        assert_eq!(params.years, 9.0);
        assert_eq!(params.total_assets, 1_000_000.0);
        assert!(run_calc(&args).is_ok());
    }

    #[test]
    fn calc_reports_invalid_input() {
        let cli = Cli::try_parse_from(["wealthcalc", "calc", "fd", "--rate=-4"]).expect("valid args");
        let Command::Calc(args) = cli.command else {
            panic!("expected calc subcommand");
        };
        let err = run_calc(&args).expect_err("negative rate");
        assert!(err.contains("annualRatePercent"));
    }
}
