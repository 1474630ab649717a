use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the built-in defaults to configs/sqlsweep.toml as a starting point
    DefaultConfig,
    /// Run fmt+clippy
    Lint,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::DefaultConfig => {
            let dir = PathBuf::from("configs");
            fs::create_dir_all(&dir)?;
            let rendered = toml::to_string_pretty(&sqlsweep::config::SweepConfig::default())?;
            fs::write(dir.join("sqlsweep.toml"), rendered)?;
            println!("Wrote configs/sqlsweep.toml");
        }
        Commands::Lint => {
            run("cargo", &["fmt", "--all"])?;
            run("cargo", &["clippy", "--all-targets", "--", "-Dwarnings"])?;
        }
    }
    Ok(())
}

fn run(cmd: &str, args: &[&str]) -> Result<()> {
    println!("+ {} {}", cmd, args.join(" "));
    let st = std::process::Command::new(cmd).args(args).status()?;
    if !st.success() {
        anyhow::bail!("command failed")
    }
    Ok(())
}
