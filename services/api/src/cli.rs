use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jobhub::billing::{catalog, PlanKind};
use jobhub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "jobhub",
    about = "Run the multi-tenant job board API or explore it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the plan catalogue offered to employers
    Plans,
    /// Walk through registration, posting, matching and hiring in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Plans => {
            print_plans();
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}

fn print_plans() {
    println!("{:<26} {:>10}  {}", "CODE", "PRICE", "INCLUDES");
    for plan in catalog() {
        let includes = match plan.kind {
            PlanKind::CreditPack { credits } => format!("{credits} posting credits"),
            PlanKind::Subscription {
                postings,
                period_days,
                candidate_search,
            } => {
                let search = if candidate_search {
                    " + candidate search"
                } else {
                    ""
                };
                format!("{postings} postings every {period_days} days{search}")
            }
        };
        println!(
            "{:<26} {:>10}  {}",
            plan.code,
            format_price(plan.price_cents),
            includes
        );
    }
}

pub(crate) fn format_price(cents: u64) -> String {
    format!("EUR {}.{:02}", cents / 100, cents % 100)
}
