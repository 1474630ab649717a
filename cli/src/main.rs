use anyhow::Result;
use clap::Parser;
use sqlsweep::config::{load_config_with_precedence, SweepConfig};
use sqlsweep::logging::init_tracing;
use sqlsweep::{cleanup, privilege, registry, services, uninstall};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

const EXIT_NOT_ELEVATED: u8 = 1;
const EXIT_STARTUP: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "sqlsweep",
    version,
    about = "Removes an installed Microsoft SQL Server suite from this host"
)]
struct Cli {
    #[arg(short, long, env = "SQLSWEEP_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match load_config_with_precedence(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sqlsweep: {e:#}");
            return ExitCode::from(EXIT_STARTUP);
        }
    };
    if let Err(e) = init_tracing(&cfg) {
        eprintln!("sqlsweep: {e:#}");
        return ExitCode::from(EXIT_STARTUP);
    }

    // Hard precondition: everything after this point touches the SCM, HKLM,
    // elevated child processes, or protected directories.
    match privilege::process_is_elevated() {
        Ok(true) => {}
        Ok(false) => {
            error!("administrator rights are required; re-run from an elevated prompt");
            return ExitCode::from(EXIT_NOT_ELEVATED);
        }
        Err(e) => {
            error!("could not confirm administrator rights: {e:#}");
            return ExitCode::from(EXIT_NOT_ELEVATED);
        }
    }

    if let Err(e) = run(&cfg) {
        error!("{e:#}");
        return ExitCode::from(EXIT_STARTUP);
    }
    ExitCode::SUCCESS
}

fn run(cfg: &SweepConfig) -> Result<()> {
    match services::stop_matching(cfg) {
        Ok(stopped) => info!(stopped, "service stop pass complete"),
        Err(e) => warn!("service stop pass failed, continuing: {e:#}"),
    }

    let products = registry::locate_products(cfg)?;
    if products.is_empty() {
        // Nothing installed is a clean result, and the residual directories
        // are left untouched on this path.
        info!(pattern = %cfg.matcher.product_pattern, "no matching products installed, nothing to do");
        return Ok(());
    }

    println!("Found {} product(s) to remove:", products.len());
    for p in &products {
        println!(
            "  {}  {}",
            p.display_name,
            p.display_version.as_deref().unwrap_or("(version unknown)")
        );
    }

    let summary = uninstall::remove_all(&products);
    info!(
        attempted = summary.attempted,
        failed = summary.failed,
        skipped = summary.skipped,
        "uninstall pass complete"
    );

    let removed = cleanup::remove_residual_dirs(cfg);
    info!(removed, "residual cleanup complete");
    Ok(())
}
