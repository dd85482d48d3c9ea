use anyhow::Result;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tracing::error;

use crate::checker::HttpChecker;
use crate::config::{Config, Settings};
use crate::reconcile::Reconciler;
use crate::self_test::{
    check_known_urls, run_self_test, KNOWN_REACHABLE_URL, KNOWN_UNREACHABLE_URL,
};
use crate::store::MySqlPolicyStore;
use crate::telemetry::init_telemetry;

mod checker;
mod config;
mod reconcile;
mod store;
mod telemetry;
#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Check privacy policy URLs, update the database",
    long_about = None
)]
struct Args {
    /// Path to a TOML file with the database credentials, see credentials.example.toml
    credentials: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Run the self-test sequence instead of updating the database
    #[arg(long)]
    test: bool,

    /// Check every URL but do not write status changes to the database
    #[arg(long)]
    dry_run: bool,

    /// Checker options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_telemetry(args.verbose || args.test);

    let settings = match Settings::from_toml(&args.credentials)
        .and_then(|settings| settings.merge(args.opt_config))
    {
        Ok(settings) => settings,
        Err(err) => exit_err!(
            1,
            "Failed to read configuration file {} with error: {:#}",
            args.credentials,
            err
        ),
    };

    let checker = HttpChecker::new(settings.checker.timeout(), &settings.checker.user_agent)?;
    if args.test {
        check_known_urls(&checker, KNOWN_REACHABLE_URL, KNOWN_UNREACHABLE_URL).await?;
    }

    let store = match MySqlPolicyStore::init(&settings.database).await {
        Ok(store) => store,
        Err(err) => exit_err!(1, "Database unavailable: {:#}", err),
    };
    let reconciler = Reconciler::new(store, checker);

    if args.test {
        return run_self_test(&reconciler).await;
    }

    let summary = reconciler.reconcile(!args.dry_run).await?;
    if summary.failed_writes > 0 {
        exit_err!(
            1,
            "{} of {} status changes could not be written",
            summary.failed_writes,
            summary.changed
        );
    }
    Ok(())
}

#[macro_export]
macro_rules! exit_err {
    ($code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        error!($fmt $(, $arg)*);
        std::process::exit($code);
    }};
}
