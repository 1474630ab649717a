use crate::config::SweepConfig;
use anyhow::Result;
use std::{ffi::OsStr, fs, path::Path};

/// Console output stays human-readable; `output.mode = "file"` switches to the
/// JSON-lines sink so fleet runs can collect the log.
pub fn init_tracing(cfg: &SweepConfig) -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlsweep=info".into());
    if cfg.output.mode == "file" {
        if let Some(path) = &cfg.output.file_path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file_appender = tracing_appender::rolling::never(
                path.parent().unwrap_or(Path::new(".")),
                path.file_name().unwrap_or_else(|| OsStr::new("sqlsweep.jsonl")),
            );
            let (nb, guard) = tracing_appender::non_blocking(file_appender);
            Box::leak(Box::new(guard));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(nb)
                .json()
                .flatten_event(true)
                .init();
        } else {
            tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
        }
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
    Ok(())
}
