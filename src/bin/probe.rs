use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::checker::{HttpChecker, ReachabilityCheck, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::telemetry::init_telemetry;

#[path = "../checker.rs"]
mod checker;
#[path = "../telemetry.rs"]
mod telemetry;

/// Check URLs without touching the database
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URLs to check
    #[arg(required = true)]
    urls: Vec<String>,

    /// Seconds to wait for each URL
    #[arg(long, env = "URL_CHECKER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// User-Agent header sent with every check
    #[arg(long, env = "URL_CHECKER_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Log successful checks as well as failures
    #[arg(long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_telemetry(args.verbose);

    let checker = HttpChecker::new(Duration::from_secs(args.timeout_secs), &args.user_agent)?;
    let mut all_reachable = true;
    for url in &args.urls {
        let reachable = checker.check(url).await;
        println!("{}\t{}", if reachable { "up" } else { "down" }, url);
        all_reachable &= reachable;
    }

    Ok(if all_reachable {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
